//! A placeholder renderer for the theme's page templates. Templates contain
//! `{{token}}` placeholders drawn from a fixed set ([`Token`]); there are no
//! conditionals or loops, so repeated structures arrive as pre-rendered HTML
//! fragments (see [`crate::fragment`]).

use crate::category::Category;
use crate::config::{GithubConfig, SiteConfig};
use crate::post::Post;
use crate::write::Pagination;
use std::borrow::Cow;
use std::path::Path;

/// Every placeholder the renderer knows how to fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    SiteTitle,
    SiteDescription,
    SiteAuthor,
    SiteAvatar,
    SiteUrl,
    SiteDate,
    SiteFavicon,
    SeoKeywords,
    GithubOwner,
    GithubRepo,
    BaseUrl,
    Posts,
    PaginationCurrent,
    PaginationTotal,
    PaginationPrevLink,
    PaginationNextLink,
    PostId,
    PostTitle,
    PostContent,
    PostCreatedAt,
    PostUpdatedAt,
    PostAuthor,
    PostGithubUrl,
    PostAvatar,
    PostUrl,
    PostExcerpt,
    PostFullUrl,
    PostCategoriesMeta,
    PostLabels,
    PostCommentsCount,
    PostIssueComments,
    Categories,
    Archives,
    CategoryName,
    CategoryColor,
    CategoryCount,
    Comments,
}

impl Token {
    pub const ALL: [Token; 37] = [
        Token::SiteTitle,
        Token::SiteDescription,
        Token::SiteAuthor,
        Token::SiteAvatar,
        Token::SiteUrl,
        Token::SiteDate,
        Token::SiteFavicon,
        Token::SeoKeywords,
        Token::GithubOwner,
        Token::GithubRepo,
        Token::BaseUrl,
        Token::Posts,
        Token::PaginationCurrent,
        Token::PaginationTotal,
        Token::PaginationPrevLink,
        Token::PaginationNextLink,
        Token::PostId,
        Token::PostTitle,
        Token::PostContent,
        Token::PostCreatedAt,
        Token::PostUpdatedAt,
        Token::PostAuthor,
        Token::PostGithubUrl,
        Token::PostAvatar,
        Token::PostUrl,
        Token::PostExcerpt,
        Token::PostFullUrl,
        Token::PostCategoriesMeta,
        Token::PostLabels,
        Token::PostCommentsCount,
        Token::PostIssueComments,
        Token::Categories,
        Token::Archives,
        Token::CategoryName,
        Token::CategoryColor,
        Token::CategoryCount,
        Token::Comments,
    ];

    /// The text between the braces, e.g. `site.title`.
    pub fn name(self) -> &'static str {
        match self {
            Token::SiteTitle => "site.title",
            Token::SiteDescription => "site.description",
            Token::SiteAuthor => "site.author",
            Token::SiteAvatar => "site.avatar",
            Token::SiteUrl => "site.url",
            Token::SiteDate => "site.date",
            Token::SiteFavicon => "site.favicon",
            Token::SeoKeywords => "seo.keywords",
            Token::GithubOwner => "github.owner",
            Token::GithubRepo => "github.repo",
            Token::BaseUrl => "baseUrl",
            Token::Posts => "posts",
            Token::PaginationCurrent => "pagination.current",
            Token::PaginationTotal => "pagination.total",
            Token::PaginationPrevLink => "pagination.prevLink",
            Token::PaginationNextLink => "pagination.nextLink",
            Token::PostId => "post.id",
            Token::PostTitle => "post.title",
            Token::PostContent => "post.content",
            Token::PostCreatedAt => "post.created_at",
            Token::PostUpdatedAt => "post.updated_at",
            Token::PostAuthor => "post.author",
            Token::PostGithubUrl => "post.github_url",
            Token::PostAvatar => "post.avatar",
            Token::PostUrl => "post.url",
            Token::PostExcerpt => "post.excerpt",
            Token::PostFullUrl => "post.full_url",
            Token::PostCategoriesMeta => "post.categories_meta",
            Token::PostLabels => "post.labels",
            Token::PostCommentsCount => "post.comments_count",
            Token::PostIssueComments => "post.issue_comments",
            Token::Categories => "categories",
            Token::Archives => "archives",
            Token::CategoryName => "category.name",
            Token::CategoryColor => "category.color",
            Token::CategoryCount => "category.count",
            Token::Comments => "comments",
        }
    }

    pub fn from_name(name: &str) -> Option<Token> {
        Token::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Resolves the token against `ctx`. Returns `None` when the page being
    /// rendered doesn't carry the data, in which case the placeholder stays.
    fn resolve<'a>(self, ctx: &'a Context<'_>) -> Option<Cow<'a, str>> {
        let site = ctx.site;
        Some(match self {
            Token::SiteTitle => Cow::Borrowed(site.title.as_str()),
            Token::SiteDescription => Cow::Borrowed(site.description.as_str()),
            Token::SiteAuthor => Cow::Borrowed(site.author.as_str()),
            Token::SiteAvatar => Cow::Borrowed(site.avatar.as_str()),
            Token::SiteUrl => Cow::Borrowed(site.url.as_str()),
            Token::SiteDate => Cow::Borrowed(site.date.as_str()),
            Token::SiteFavicon => Cow::Borrowed(site.favicon.as_str()),
            Token::SeoKeywords => Cow::Owned(ctx.keywords.join(", ")),
            Token::GithubOwner => Cow::Borrowed(ctx.github.owner.as_str()),
            Token::GithubRepo => Cow::Borrowed(ctx.github.repo.as_str()),
            Token::BaseUrl => Cow::Borrowed(ctx.base_path),
            Token::Posts => Cow::Borrowed(ctx.posts.as_deref()?),
            Token::PaginationCurrent => Cow::Owned(ctx.pagination?.current.to_string()),
            Token::PaginationTotal => Cow::Owned(ctx.pagination?.total.to_string()),
            Token::PaginationPrevLink => Cow::Owned(ctx.pagination?.prev_link()),
            Token::PaginationNextLink => Cow::Owned(ctx.pagination?.next_link()),
            Token::PostId => Cow::Owned(ctx.post?.post.id.to_string()),
            Token::PostTitle => Cow::Owned(escape_html(&ctx.post?.post.title)),
            Token::PostContent => Cow::Borrowed(ctx.post?.post.content.as_str()),
            Token::PostCreatedAt => Cow::Owned(ctx.post?.post.created_date()),
            Token::PostUpdatedAt => Cow::Owned(ctx.post?.post.updated_date()),
            Token::PostAuthor => Cow::Owned(escape_html(&ctx.post?.post.author)),
            Token::PostGithubUrl => Cow::Borrowed(ctx.post?.post.github_url.as_str()),
            Token::PostAvatar => Cow::Borrowed(ctx.post?.post.avatar.as_str()),
            Token::PostUrl => Cow::Borrowed(ctx.post?.post.url.as_str()),
            Token::PostExcerpt => Cow::Owned(escape_html(&ctx.post?.post.excerpt)),
            Token::PostFullUrl => Cow::Borrowed(ctx.post?.full_url.as_str()),
            Token::PostCategoriesMeta => Cow::Borrowed(ctx.post?.categories_meta.as_str()),
            Token::PostLabels => Cow::Borrowed(ctx.post?.labels.as_str()),
            Token::PostCommentsCount => Cow::Owned(ctx.post?.post.comments_count.to_string()),
            Token::PostIssueComments => Cow::Borrowed(ctx.post?.issue_comments.as_str()),
            Token::Categories => Cow::Borrowed(ctx.categories.as_deref()?),
            Token::Archives => Cow::Borrowed(ctx.archives.as_deref()?),
            Token::CategoryName => Cow::Owned(escape_html(&ctx.category?.name)),
            Token::CategoryColor => Cow::Borrowed(ctx.category?.color.as_str()),
            Token::CategoryCount => Cow::Owned(ctx.category?.posts.len().to_string()),
            Token::Comments => Cow::Borrowed(ctx.comments.as_str()),
        })
    }
}

/// The per-post fragments a post page needs, rendered by the caller.
pub struct PostView<'a> {
    pub post: &'a Post,
    pub full_url: String,
    pub categories_meta: String,
    pub labels: String,
    pub issue_comments: String,
}

/// The data bag for one page. Site-wide fields are always present; the
/// optional fields are set only for the page types that use them.
pub struct Context<'a> {
    pub site: &'a SiteConfig,
    pub github: &'a GithubConfig,
    pub keywords: &'a [String],
    pub base_path: &'a str,
    pub posts: Option<String>,
    pub pagination: Option<&'a Pagination>,
    pub post: Option<&'a PostView<'a>>,
    pub categories: Option<String>,
    pub archives: Option<String>,
    pub category: Option<&'a Category>,
    pub comments: String,
}

impl<'a> Context<'a> {
    /// A context with only the site-wide fields set.
    pub fn new(
        site: &'a SiteConfig,
        github: &'a GithubConfig,
        keywords: &'a [String],
        base_path: &'a str,
    ) -> Self {
        Context {
            site,
            github,
            keywords,
            base_path,
            posts: None,
            pagination: None,
            post: None,
            categories: None,
            archives: None,
            category: None,
            comments: String::new(),
        }
    }
}

/// Fills the recognized placeholders in `template`. Unknown placeholders and
/// placeholders whose data is absent are copied through verbatim. Substituted
/// text is never scanned again, so placeholders inside post bodies survive.
pub fn render(template: &str, ctx: &Context) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
            Some(end) => match Token::from_name(&after[..end]) {
                Some(token) => {
                    match token.resolve(ctx) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after[end + 2..];
                }
                // A stray `{{` is literal text; a real token may follow it.
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            },
        }
    }
    out.push_str(rest);
    out
}

/// Lists the `{{...}}` placeholders in `template` that aren't [`Token`]s.
pub fn unknown_tokens(template: &str) -> Vec<&str> {
    let mut unknown = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            None => break,
            Some(end) => {
                let name = &after[..end];
                if name.contains("{{") {
                    rest = after;
                    continue;
                }
                if Token::from_name(name).is_none() {
                    unknown.push(name);
                }
                rest = &after[end + 2..];
            }
        }
    }
    unknown
}

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The theme's page templates.
#[derive(Clone, Debug, Default)]
pub struct Templates {
    pub index: String,
    pub post: String,
    pub category: String,
    pub categories: String,
    pub archives: String,
    pub search: String,
}

impl Templates {
    /// Loads the six page templates from `dir`. A missing or unreadable
    /// template is replaced by an empty one so the build can proceed.
    pub fn load(dir: &Path) -> Templates {
        let load = |file: &str| -> String {
            let path = dir.join(file);
            match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    for name in unknown_tokens(&contents) {
                        tracing::warn!(template = %path.display(), token = name, "unknown template token");
                    }
                    contents
                }
                Err(e) => {
                    tracing::warn!(template = %path.display(), %e, "template not found, using an empty template");
                    String::new()
                }
            }
        };

        Templates {
            index: load("index.html"),
            post: load("post.html"),
            category: load("category.html"),
            categories: load("categories.html"),
            archives: load("archives.html"),
            search: load("search.html"),
        }
    }
}
