//! The client-side search index (`search-data.json`).

use crate::post::Post;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct SearchLabel<'a> {
    pub name: &'a str,
    pub color: &'a str,
}

/// One post as seen by the search page's script.
#[derive(Serialize, Debug)]
pub struct SearchEntry<'a> {
    pub id: u64,
    pub title: &'a str,
    pub excerpt: &'a str,
    pub url: &'a str,
    /// `YYYY-MM-DD`.
    pub created_at: String,
    pub labels: Vec<SearchLabel<'a>>,
}

/// Builds one entry per post, in the order given.
pub fn entries(posts: &[Post]) -> Vec<SearchEntry<'_>> {
    posts
        .iter()
        .map(|post| SearchEntry {
            id: post.id,
            title: &post.title,
            excerpt: &post.excerpt,
            url: &post.url,
            created_at: post.created_date(),
            labels: post
                .labels
                .iter()
                .map(|l| SearchLabel {
                    name: &l.name,
                    color: &l.color,
                })
                .collect(),
        })
        .collect()
}

/// Serializes the index as pretty-printed JSON.
pub fn to_json(posts: &[Post]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&entries(posts))
}
