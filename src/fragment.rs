//! Pre-rendered HTML fragments for the repeated structures the templates
//! can't express: post cards, label and category chips, the archives list,
//! and issue comments. All user-controlled text is escaped here.

use crate::archive::Archive;
use crate::category::{slugify, Categories};
use crate::config::GithubConfig;
use crate::github::Label;
use crate::post::Post;
use crate::template::escape_html;
use std::fmt::Write;

/// Renders one card per post for index and category pages. With no posts,
/// renders a prompt linking to the repository's new-issue form.
pub fn post_cards<'a>(posts: impl IntoIterator<Item = &'a Post>, github: &GithubConfig) -> String {
    let mut html = String::new();
    for post in posts {
        let pin = match post.is_pinned {
            true => r#"<span class="pin-icon" title="Pinned">📌</span>"#,
            false => "",
        };
        let _ = write!(
            html,
            concat!(
                "<a href=\"{url}\" class=\"index-post-card\">\n",
                "<div class=\"post\">\n",
                "<div class=\"post-title\">{pin}<span>{title}</span></div>\n",
                "<div class=\"post-excerpt\">{excerpt}</div>\n",
                "<div class=\"post-meta\"><time>{date}</time><div class=\"post-labels\">{labels}</div></div>\n",
                "</div>\n",
                "</a>\n",
            ),
            url = escape_html(&post.url),
            pin = pin,
            title = escape_html(&post.title),
            excerpt = escape_html(&post.excerpt),
            date = post.created_date(),
            labels = label_chips(&post.labels),
        );
    }

    if html.is_empty() {
        let _ = write!(
            html,
            concat!(
                "<div class=\"no-posts\">\n",
                "<div class=\"no-posts-icon\">📝</div>\n",
                "<div class=\"no-posts-title\">No posts yet</div>\n",
                "<div class=\"no-posts-hint\">Open an issue on GitHub to publish your first post.</div>\n",
                "<a href=\"https://github.com/{owner}/{repo}/issues/new\" target=\"_blank\" class=\"btn\">Write a post</a>\n",
                "</div>\n",
            ),
            owner = escape_html(&github.owner),
            repo = escape_html(&github.repo),
        );
    }
    html
}

/// Small colored label chips used on post cards.
pub fn label_chips(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| {
            format!(
                "<span class=\"category\" style=\"background-color: #{color}20; color: #{color}\">{name}</span>",
                color = escape_html(&label.color),
                name = escape_html(&label.name),
            )
        })
        .collect()
}

/// Bordered label chips used on post pages (`{{post.labels}}`).
pub fn post_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| {
            format!(
                "<span class=\"category\" style=\"background-color: #{color}20; color: #{color}; border: 1px solid #{color}40\">{name}</span>",
                color = escape_html(&label.color),
                name = escape_html(&label.name),
            )
        })
        .collect()
}

/// The post page's category links (`{{post.categories_meta}}`). Empty when
/// the post has no labels.
pub fn categories_meta(post: &Post, base_path: &str) -> String {
    if post.labels.is_empty() {
        return String::new();
    }
    let links: Vec<String> = post
        .labels
        .iter()
        .map(|label| {
            format!(
                "<a href=\"{}/categories/{}.html\">{}</a>",
                base_path,
                slugify(&label.name),
                escape_html(&label.name)
            )
        })
        .collect();
    format!(
        "<span class=\"post-categories\"><span class=\"icon-folder\"></span><span>{}</span></span>",
        links.join(", ")
    )
}

/// One chip per category with its post count (`{{categories}}`).
pub fn category_chips(categories: &Categories, base_path: &str) -> String {
    categories
        .iter()
        .map(|category| {
            format!(
                concat!(
                    "<span class=\"card-small\">",
                    "<span class=\"icon-folder\"></span>",
                    "<a href=\"{url}\">{name}</a>",
                    "<span>{count}</span>",
                    "</span>\n",
                ),
                url = category.url(base_path),
                name = escape_html(&category.name),
                count = category.posts.len(),
            )
        })
        .collect()
}

/// The archives listing (`{{archives}}`): a section per year, newest first,
/// with a heading per month.
pub fn archives(archive: &Archive, posts: &[Post]) -> String {
    let mut html = String::new();
    for year in archive.years() {
        let _ = writeln!(
            html,
            "<div class=\"year-group\">\n<h2>{} ({} posts)</h2>",
            year.year,
            year.post_count()
        );
        for month in year.months.iter() {
            let _ = writeln!(html, "<h3>{}-{:02}</h3>\n<div class=\"month-group\">", year.year, month.month);
            for post in month.posts.iter().map(|i| &posts[*i]) {
                let _ = writeln!(
                    html,
                    "<div class=\"archive-item\"><a href=\"{}\">{}</a><time>{}</time></div>",
                    escape_html(&post.url),
                    escape_html(&post.title),
                    post.created_date(),
                );
            }
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n");
    }
    html
}

/// The issue's own comments (`{{post.issue_comments}}`). Comment bodies are
/// rendered markdown from the issue thread and inserted as-is.
pub fn issue_comments(post: &Post) -> String {
    if post.comments.is_empty() {
        return String::new();
    }
    let mut html = String::from("<div class=\"issue-comments\">\n");
    for comment in post.comments.iter() {
        let _ = write!(
            html,
            concat!(
                "<div class=\"issue-comment\">\n",
                "<div class=\"issue-comment-meta\"><img src=\"{avatar}\" alt=\"{author}\" class=\"avatar\"><span>{author}</span><time>{date}</time></div>\n",
                "<div class=\"issue-comment-body\">{body}</div>\n",
                "</div>\n",
            ),
            avatar = escape_html(&comment.avatar),
            author = escape_html(&comment.author),
            date = comment.created_at.format("%Y-%m-%d"),
            body = comment.content,
        );
    }
    html.push_str("</div>\n");
    html
}
