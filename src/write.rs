//! Templating and writing of every output page: paginated indices, posts,
//! categories, archives, search, plus the search index, sitemap, and feed.

use crate::archive::Archive;
use crate::category::{Categories, Category};
use crate::config::Config;
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::fragment;
use crate::paths;
use crate::post::Post;
use crate::sitemap;
use crate::template::{render, Context, PostView, Templates};
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Splits `len` items into consecutive pages of at most `size` items. There
/// is always at least one (possibly empty) page.
pub fn page_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    if len == 0 {
        return vec![0..0];
    }
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Navigation state for one index page. Page 1 is `index.html`; page `n > 1`
/// is `page/{n}.html`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based.
    pub current: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    pub fn new(current: usize, total: usize, base_path: &str) -> Pagination {
        let has_prev = current > 1;
        let has_next = current < total;
        Pagination {
            current,
            total,
            has_prev,
            has_next,
            prev_url: match current {
                _ if !has_prev => None,
                2 => Some(format!("{}/", base_path)),
                n => Some(format!("{}/page/{}.html", base_path, n - 1)),
            },
            next_url: match has_next {
                true => Some(format!("{}/page/{}.html", base_path, current + 1)),
                false => None,
            },
        }
    }

    /// The anchor to the previous page, or an empty string on the first.
    pub fn prev_link(&self) -> String {
        match &self.prev_url {
            Some(url) => format!("<a href=\"{}\" class=\"btn\">← Previous</a>", url),
            None => String::new(),
        }
    }

    /// The anchor to the next page, or an empty string on the last.
    pub fn next_link(&self) -> String {
        match &self.next_url {
            Some(url) => format!("<a href=\"{}\" class=\"btn\">Next →</a>", url),
            None => String::new(),
        }
    }
}

/// Returns `scheme://host[:port]` of `site_url`, or `None` when it doesn't
/// parse as an absolute URL.
pub fn origin(site_url: &str) -> Option<String> {
    let url = url::Url::parse(site_url).ok()?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Some(origin.ascii_serialization()),
        url::Origin::Opaque(_) => None,
    }
}

/// Responsible for templating and writing every output file for one build.
pub struct Writer<'a> {
    pub config: &'a Config,
    pub templates: &'a Templates,

    /// See [`crate::paths::detect_base_path`].
    pub base_path: &'a str,

    /// The root of the generated site.
    pub output_directory: &'a Path,

    /// The posts in display order.
    pub posts: &'a [Post],
    pub categories: &'a Categories,
}

impl Writer<'_> {
    /// Writes every page and data file. `today` (`YYYY-MM-DD`) dates the
    /// sitemap entries that aren't posts.
    pub fn write_all(&self, today: &str) -> Result<()> {
        self.write_index_pages()?;
        self.write_post_pages()?;
        self.write_category_pages()?;
        self.write_archives()?;
        self.write_search()?;
        if self.config.seo.generate_sitemap {
            self.write_sitemap(today)?;
        }
        if self.config.seo.generate_feed {
            self.write_feed()?;
        }
        Ok(())
    }

    fn context(&self) -> Context<'_> {
        Context::new(
            &self.config.site,
            &self.config.github,
            &self.config.seo.keywords,
            self.base_path,
        )
    }

    /// Writes `index.html` and `page/{n}.html` for every further page.
    pub fn write_index_pages(&self) -> Result<()> {
        let ranges = page_ranges(self.posts.len(), self.config.build.posts_per_page);
        let total = ranges.len();
        for (i, range) in ranges.into_iter().enumerate() {
            let current = i + 1;
            let pagination = Pagination::new(current, total, self.base_path);
            let mut ctx = self.context();
            ctx.posts = Some(fragment::post_cards(
                &self.posts[range],
                &self.config.github,
            ));
            ctx.pagination = Some(&pagination);

            let file = match current {
                1 => PathBuf::from("index.html"),
                n => Path::new("page").join(format!("{}.html", n)),
            };
            self.write_page(&file, &render(&self.templates.index, &ctx))?;
        }
        tracing::info!(pages = total, "wrote index pages");
        Ok(())
    }

    /// Writes `posts/{id}.html` for every post.
    pub fn write_post_pages(&self) -> Result<()> {
        let origin = origin(&self.config.site.url).unwrap_or_default();
        for post in self.posts {
            let view = PostView {
                post,
                full_url: format!("{}{}", origin, post.url),
                categories_meta: fragment::categories_meta(post, self.base_path),
                labels: fragment::post_labels(&post.labels),
                issue_comments: fragment::issue_comments(post),
            };
            let mut ctx = self.context();
            ctx.post = Some(&view);
            ctx.comments = crate::comments::render(&self.config.comments, post);

            let file = Path::new("posts").join(format!("{}.html", post.id));
            self.write_page(&file, &render(&self.templates.post, &ctx))?;
        }
        tracing::info!(posts = self.posts.len(), "wrote post pages");
        Ok(())
    }

    /// Writes `categories.html` and `categories/{slug}.html` per category.
    pub fn write_category_pages(&self) -> Result<()> {
        let mut ctx = self.context();
        ctx.categories = Some(fragment::category_chips(self.categories, self.base_path));
        self.write_page(
            Path::new("categories.html"),
            &render(&self.templates.categories, &ctx),
        )?;

        for category in self.categories.iter() {
            self.write_category_page(category)?;
        }
        tracing::info!(categories = self.categories.len(), "wrote category pages");
        Ok(())
    }

    fn write_category_page(&self, category: &Category) -> Result<()> {
        let mut ctx = self.context();
        ctx.category = Some(category);
        ctx.posts = Some(fragment::post_cards(
            category.posts.iter().map(|i| &self.posts[*i]),
            &self.config.github,
        ));
        let file = Path::new("categories").join(format!("{}.html", category.slug));
        self.write_page(&file, &render(&self.templates.category, &ctx))
    }

    /// Writes `archives.html`.
    pub fn write_archives(&self) -> Result<()> {
        let archive = Archive::from_posts(self.posts);
        let mut ctx = self.context();
        ctx.archives = Some(fragment::archives(&archive, self.posts));
        self.write_page(
            Path::new("archives.html"),
            &render(&self.templates.archives, &ctx),
        )
    }

    /// Writes `search.html` and its index, `search-data.json`.
    pub fn write_search(&self) -> Result<()> {
        let ctx = self.context();
        self.write_page(
            Path::new("search.html"),
            &render(&self.templates.search, &ctx),
        )?;

        let json = crate::search::to_json(self.posts)?;
        self.write_file(Path::new("search-data.json"), &json)
    }

    /// Writes `sitemap.xml`, or skips it with a warning when the site URL
    /// isn't set.
    pub fn write_sitemap(&self, today: &str) -> Result<()> {
        let site_url = &self.config.site.url;
        let origin = match origin(site_url) {
            Some(origin) => origin,
            None => {
                tracing::warn!("site.url is not set to an absolute URL, skipping sitemap");
                return Ok(());
            }
        };
        let site = sitemap::Site {
            url: site_url,
            origin: &origin,
            base_path: self.base_path,
        };
        let xml = sitemap::render(&site, self.posts, self.categories, today);
        self.write_file(Path::new("sitemap.xml"), &xml)
    }

    /// Writes `feed.xml`, or skips it with a warning when the site URL isn't
    /// set.
    pub fn write_feed(&self) -> Result<()> {
        let site = &self.config.site;
        let origin = match origin(&site.url) {
            Some(origin) => origin,
            None => {
                tracing::warn!("site.url is not set to an absolute URL, skipping feed");
                return Ok(());
            }
        };
        let config = FeedConfig {
            title: &site.title,
            subtitle: &site.description,
            author: &site.author,
            home_page: &site.url,
            origin: &origin,
        };
        let path = self.output_directory.join("feed.xml");
        let file = File::create(&path).map_err(|err| Error::Create {
            path: path.clone(),
            err,
        })?;
        write_feed(&config, self.posts, BufWriter::new(file))?;
        tracing::debug!(path = %path.display(), "wrote feed");
        Ok(())
    }

    /// Rewrites `html` for the base path and writes it to `file` (relative
    /// to the output directory).
    fn write_page(&self, file: &Path, html: &str) -> Result<()> {
        self.write_file(file, &paths::rewrite(html, self.base_path))
    }

    fn write_file(&self, file: &Path, contents: &str) -> Result<()> {
        let path = self.output_directory.join(file);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Create {
                path: dir.to_owned(),
                err,
            })?;
        }
        std::fs::write(&path, contents).map_err(|err| Error::Create {
            path: path.clone(),
            err,
        })?;
        tracing::debug!(path = %path.display(), "wrote file");
        Ok(())
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error creating an output file or its directory.
    #[error("writing '{}': {err}", .path.display())]
    Create { path: PathBuf, err: std::io::Error },

    /// An error serializing the search index.
    #[error("serializing search index: {0}")]
    Json(#[from] serde_json::Error),

    /// An error writing the Atom feed.
    #[error(transparent)]
    Feed(#[from] FeedError),
}
