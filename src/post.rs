//! Defines the [`Post`] type and the [`Transformer`] that converts fetched
//! issues into posts: markdown rendering, image proxying, excerpts, and the
//! pinned/updated flags.

use crate::github::{Issue, Label};
use crate::markdown::Renderer;
use crate::proxy::proxy_images;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

/// Label names (compared lowercased) that pin a post to the top of the index.
const PIN_LABELS: [&str; 2] = ["pinned", "置顶"];

/// A post is considered edited when it was updated more than this long after
/// it was created.
const UPDATE_THRESHOLD_SECONDS: i64 = 60;

/// A blog post, created once per issue.
#[derive(Clone, Debug)]
pub struct Post {
    /// The issue number.
    pub id: u64,
    pub title: String,
    /// The rendered HTML body.
    pub content: String,
    /// Plain-text summary, truncated to the configured length.
    pub excerpt: String,
    pub author: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_updated: bool,
    pub is_pinned: bool,
    /// The site-relative URL, including the base path.
    pub url: String,
    pub github_url: String,
    pub labels: Vec<Label>,
    pub comments_count: u64,
    pub comments: Vec<PostComment>,
}

/// An issue comment, rendered for display under the post.
#[derive(Clone, Debug)]
pub struct PostComment {
    pub author: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
}

impl Post {
    /// The creation date as `YYYY-MM-DD`.
    pub fn created_date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }

    /// The last update date as `YYYY-MM-DD`.
    pub fn updated_date(&self) -> String {
        self.updated_at.format("%Y-%m-%d").to_string()
    }
}

/// Converts [`Issue`]s into [`Post`]s.
pub struct Transformer<'a> {
    /// Prefixed onto post URLs (see [`crate::paths::detect_base_path`]).
    pub base_path: &'a str,

    /// The maximum excerpt length in characters.
    pub excerpt_length: usize,

    /// The image proxy prefix, when proxying is enabled.
    pub image_proxy: Option<&'a str>,

    pub renderer: Renderer,
}

impl Transformer<'_> {
    pub fn transform(&self, issue: &Issue) -> Post {
        let body = issue.body.as_deref().unwrap_or_default();
        let content = match self.image_proxy {
            Some(proxy) => self.renderer.render(&proxy_images(body, proxy)),
            None => self.renderer.render(body),
        };

        Post {
            id: issue.number,
            title: issue.title.clone(),
            content,
            excerpt: excerpt(body, self.excerpt_length),
            author: issue.user.login.clone(),
            avatar: issue.user.avatar_url.clone(),
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            is_updated: issue.updated_at - issue.created_at
                > Duration::seconds(UPDATE_THRESHOLD_SECONDS),
            is_pinned: is_pinned(&issue.labels),
            url: format!("{}/posts/{}.html", self.base_path, issue.number),
            github_url: issue.html_url.clone(),
            labels: issue.labels.clone(),
            comments_count: issue.comments,
            comments: issue
                .issue_comments
                .iter()
                .map(|c| PostComment {
                    author: c.user.login.clone(),
                    avatar: c.user.avatar_url.clone(),
                    created_at: c.created_at,
                    content: self.renderer.render(c.body.as_deref().unwrap_or_default()),
                })
                .collect(),
        }
    }

    /// Transforms every issue and returns the posts in display order (see
    /// [`sort_posts`]).
    pub fn transform_all(&self, issues: &[Issue]) -> Vec<Post> {
        let mut posts: Vec<Post> = issues.iter().map(|i| self.transform(i)).collect();
        sort_posts(&mut posts);
        posts
    }
}

/// Strips markdown punctuation (`#*\`[]`) from `body` and truncates it to
/// `length` characters, appending `...` when anything was cut.
pub fn excerpt(body: &str, length: usize) -> String {
    let plain: String = body
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`' | '[' | ']'))
        .collect();
    let plain = plain.trim();
    match plain.char_indices().nth(length) {
        Some((cut, _)) => format!("{}...", &plain[..cut]),
        None => plain.to_owned(),
    }
}

/// Returns true when any label is a pin marker.
pub fn is_pinned(labels: &[Label]) -> bool {
    labels
        .iter()
        .any(|l| PIN_LABELS.contains(&l.name.to_lowercase().as_str()))
}

/// Orders posts for display: pinned posts first, then newest first.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(compare);
}

fn compare(a: &Post, b: &Post) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::github::{Comment, User};
    use chrono::TimeZone;

    pub(crate) fn issue(number: u64, day: u32, labels: &[&str]) -> Issue {
        let created = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
        Issue {
            number,
            title: format!("Post <{}>", number),
            body: Some(format!("# Heading {}\n\nSome **bold** text.", number)),
            created_at: created,
            updated_at: created,
            html_url: format!("https://github.com/octocat/notes/issues/{}", number),
            user: User {
                login: String::from("octocat"),
                avatar_url: String::from("https://a/octocat.png"),
            },
            labels: labels
                .iter()
                .map(|name| Label {
                    name: (*name).to_owned(),
                    color: String::from("0075ca"),
                })
                .collect(),
            comments: 0,
            pull_request: None,
            issue_comments: Vec::new(),
        }
    }

    pub(crate) fn transformer() -> Transformer<'static> {
        Transformer {
            base_path: "",
            excerpt_length: 150,
            image_proxy: None,
            renderer: Renderer::new(),
        }
    }

    #[test]
    fn test_excerpt() {
        assert_eq!("Title\n\nbold code link", excerpt("# Title\n\n**bold** `code` [link]", 150));
        assert_eq!("abcde...", excerpt("abcdefgh", 5));
        assert_eq!("abcde", excerpt("abcde", 5));
        assert_eq!("你好世界...", excerpt("## 你好世界，欢迎", 4));
        assert_eq!("", excerpt("", 10));
    }

    #[test]
    fn test_is_pinned() {
        let labels = |names: &[&str]| -> Vec<Label> {
            names
                .iter()
                .map(|n| Label {
                    name: (*n).to_owned(),
                    color: String::new(),
                })
                .collect()
        };
        assert!(is_pinned(&labels(&["rust", "Pinned"])));
        assert!(is_pinned(&labels(&["置顶"])));
        assert!(!is_pinned(&labels(&["pin", "top"])));
        assert!(!is_pinned(&[]));
    }

    #[test]
    fn test_transform() {
        let mut issue = issue(7, 3, &["rust"]);
        issue.updated_at = issue.created_at + Duration::seconds(61);
        issue.comments = 1;
        issue.issue_comments.push(Comment {
            user: issue.user.clone(),
            body: Some(String::from("*thanks*")),
            created_at: issue.created_at,
        });

        let post = Transformer {
            base_path: "/blog",
            ..transformer()
        }
        .transform(&issue);
        assert_eq!(7, post.id);
        assert_eq!("/blog/posts/7.html", post.url);
        assert!(post.is_updated);
        assert!(!post.is_pinned);
        assert!(post.content.contains(r#"<h1 id="heading-7">Heading 7</h1>"#));
        assert_eq!("Heading 7\n\nSome bold text.", post.excerpt);
        assert_eq!("2024-01-03", post.created_date());
        assert_eq!(1, post.comments.len());
        assert!(post.comments[0].content.contains("<em>thanks</em>"));
    }

    #[test]
    fn test_transform_not_updated_within_a_minute() {
        let mut issue = issue(1, 1, &[]);
        issue.updated_at = issue.created_at + Duration::seconds(60);
        assert!(!transformer().transform(&issue).is_updated);
    }

    #[test]
    fn test_transform_proxies_images() {
        let mut issue = issue(1, 1, &[]);
        issue.body = Some(String::from("![alt](http://x.com/a.png)"));
        let post = Transformer {
            image_proxy: Some("https://images.weserv.nl/?url="),
            ..transformer()
        }
        .transform(&issue);
        assert!(
            post.content.contains(r#"src="https://images.weserv.nl/?url=http://x.com/a.png""#),
            "{}",
            post.content
        );
    }

    #[test]
    fn test_sort_posts() {
        let issues = vec![
            issue(1, 1, &["置顶"]),
            issue(2, 2, &[]),
            issue(3, 3, &[]),
            issue(4, 4, &["pinned"]),
        ];
        let posts = transformer().transform_all(&issues);
        assert_eq!(
            vec![4, 1, 3, 2],
            posts.iter().map(|p| p.id).collect::<Vec<_>>()
        );
    }
}
