//! Defines [`Category`], the index of posts sharing an issue label, and the
//! pinyin-based slugs used for category page file names.

use crate::post::Post;
use pinyin::ToPinyin;
use std::collections::HashMap;

/// The file name used when a category name slugifies to nothing.
const FALLBACK_SLUG: &str = "category";

/// A label and the posts carrying it.
#[derive(Clone, Debug)]
pub struct Category {
    pub name: String,
    /// The color of the first label seen with this name.
    pub color: String,
    /// The page file name (without `.html`), see [`slugify`].
    pub slug: String,
    /// Indices into the post list the categories were built from, in that
    /// list's order.
    pub posts: Vec<usize>,
}

impl Category {
    /// The category page URL, including the base path.
    pub fn url(&self, base_path: &str) -> String {
        format!("{}/categories/{}.html", base_path, self.slug)
    }
}

/// All categories, in the order their labels were first seen.
#[derive(Clone, Debug, Default)]
pub struct Categories {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl Categories {
    /// Indexes `posts` by label in a single pass.
    pub fn from_posts(posts: &[Post]) -> Categories {
        let mut categories = Categories::default();
        for (i, post) in posts.iter().enumerate() {
            for label in post.labels.iter() {
                let slot = match categories.index.get(&label.name) {
                    Some(slot) => *slot,
                    None => {
                        categories.categories.push(Category {
                            name: label.name.clone(),
                            color: label.color.clone(),
                            slug: slugify(&label.name),
                            posts: Vec::new(),
                        });
                        let slot = categories.categories.len() - 1;
                        categories.index.insert(label.name.clone(), slot);
                        slot
                    }
                };
                let members = &mut categories.categories[slot].posts;
                // A label repeated on one issue still lists the post once.
                if members.last() != Some(&i) {
                    members.push(i);
                }
            }
        }
        categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.index.get(name).map(|slot| &self.categories[*slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Converts a category name into a URL-safe file name. Chinese characters
/// become toneless pinyin syllables, one word each; runs of other characters
/// stay together as one word. The words are joined with `-` and normalized
/// with [`slug::slugify`]. Never returns an empty string.
pub fn slugify(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut run = String::new();
    for c in name.chars() {
        match c.to_pinyin() {
            Some(pinyin) => {
                if !run.is_empty() {
                    words.push(std::mem::take(&mut run));
                }
                words.push(pinyin.plain().to_owned());
            }
            None => run.push(c),
        }
    }
    if !run.is_empty() {
        words.push(run);
    }

    let slug = slug::slugify(words.join("-"));
    match slug.is_empty() {
        true => FALLBACK_SLUG.to_owned(),
        false => slug,
    }
}
