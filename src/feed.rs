//! Support for creating an Atom feed (`feed.xml`) from the list of posts.

use crate::post::Post;
use atom_syndication::{
    CategoryBuilder, ContentBuilder, Entry, EntryBuilder, Error as AtomError, Feed, FeedBuilder,
    FixedDateTime, Link, LinkBuilder, Person, PersonBuilder, Text,
};
use chrono::Utc;
use std::io::Write;

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    /// The feed author; omitted when empty.
    pub author: &'a str,
    /// The absolute URL of the home page; also the feed id.
    pub home_page: &'a str,
    /// `scheme://host[:port]`, prefixed onto post URLs.
    pub origin: &'a str,
}

/// Creates a feed from `config` and `posts` and writes the result to `w`.
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

fn feed(config: &FeedConfig, posts: &[Post]) -> Feed {
    // The feed changes whenever its newest post does.
    let updated: FixedDateTime = posts
        .iter()
        .map(|p| p.updated_at)
        .max()
        .unwrap_or_else(Utc::now)
        .into();

    let mut builder = FeedBuilder::default();
    builder
        .title(config.title)
        .id(config.home_page)
        .updated(updated)
        .authors(people(config.author))
        .links(vec![alternate(config.home_page)])
        .entries(
            posts
                .iter()
                .map(|post| entry(config, post))
                .collect::<Vec<Entry>>(),
        );
    if !config.subtitle.is_empty() {
        builder.subtitle(Some(Text::from(config.subtitle)));
    }
    builder.build()
}

fn entry(config: &FeedConfig, post: &Post) -> Entry {
    let url = format!("{}{}", config.origin, post.url);
    let published: FixedDateTime = post.created_at.into();
    EntryBuilder::default()
        .id(url.clone())
        .title(post.title.clone())
        .updated(post.updated_at)
        .published(Some(published))
        .authors(people(&post.author))
        .links(vec![alternate(&url)])
        .summary(Some(Text::from(post.excerpt.clone())))
        .content(Some(
            ContentBuilder::default()
                .value(Some(post.content.clone()))
                .content_type(Some(String::from("html")))
                .build(),
        ))
        .categories(
            post.labels
                .iter()
                .map(|l| CategoryBuilder::default().term(l.name.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build()
}

fn alternate(href: &str) -> Link {
    LinkBuilder::default()
        .href(href)
        .rel("alternate")
        .mime_type(Some(String::from("text/html")))
        .build()
}

fn people(name: &str) -> Vec<Person> {
    match name.is_empty() {
        true => Vec::new(),
        false => vec![PersonBuilder::default().name(name).build()],
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the feed can't be serialized or written.
    #[error("writing Atom feed: {0}")]
    Atom(#[from] AtomError),
}
