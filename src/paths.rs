//! Base-path detection and the path rewriter applied to every HTML page. A
//! site served from `https://example.org/blog/` needs `/blog` in front of
//! every root-relative asset and navigation link the templates emit.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static HTML_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="/([^"]*\.html)""#).unwrap());
static JSON_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="/([^"]*\.json)""#).unwrap());

/// Derives the base path from the configured site URL. Returns the empty
/// string for root-domain deployments and `/segment[/segment...]` (no
/// trailing slash) otherwise. When `site_url` can't be parsed, guesses a
/// GitHub project page (`/{repo}`) unless the repository looks like a user
/// site.
pub fn detect_base_path(site_url: &str, owner: &str, repo: &str) -> String {
    if site_url.is_empty() {
        return String::new();
    }

    match Url::parse(site_url) {
        Ok(url) => url.path().trim_end_matches('/').to_owned(),
        Err(e) => {
            tracing::warn!(%e, site_url, "failed to parse site URL, guessing base path from repository");
            if repo.is_empty() || repo == owner || repo.to_lowercase().ends_with(".github.io") {
                String::new()
            } else {
                format!("/{}", repo)
            }
        }
    }
}

/// Rewrites root-relative and `./`-relative links in `html` so they resolve
/// under `base_path`.
///
/// With an empty base path only `./assets/` references are normalized to
/// `/assets/`. Otherwise the rewrite is line-oriented and any line that
/// already contains `base_path` is left alone, which makes the operation
/// idempotent.
pub fn rewrite(html: &str, base_path: &str) -> String {
    if base_path.is_empty() {
        return html
            .replace(r#"href="./assets/"#, r#"href="/assets/"#)
            .replace(r#"src="./assets/"#, r#"src="/assets/"#);
    }

    html.split('\n')
        .map(|line| {
            if line.contains(base_path) {
                return line.to_owned();
            }
            rewrite_line(line, base_path)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn rewrite_line(line: &str, base: &str) -> String {
    let line = line
        .replace(r#"href="./assets/"#, &format!(r#"href="{}/assets/"#, base))
        .replace(r#"src="./assets/"#, &format!(r#"src="{}/assets/"#, base))
        .replace(r#"href="/assets/"#, &format!(r#"href="{}/assets/"#, base))
        .replace(r#"src="/assets/"#, &format!(r#"src="{}/assets/"#, base))
        .replace(r#"href="/""#, &format!(r#"href="{}/""#, base));
    let line = HTML_LINK.replace_all(&line, format!(r#"href="{}/$1""#, base).as_str());
    let line = JSON_LINK.replace_all(&line, format!(r#"href="{}/$1""#, base).as_str());
    line.replace(
        "fetch('/search-data.json')",
        &format!("fetch('{}/search-data.json')", base),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_detect_base_path() {
        fixture_detect("", "", "someone", "blog");
        fixture_detect("", "https://someone.github.io", "someone", "someone.github.io");
        fixture_detect("", "https://example.com/", "someone", "blog");
        fixture_detect("/looks-blog", "https://someone.github.io/looks-blog", "someone", "looks-blog");
        fixture_detect("/blog", "https://example.com/blog/", "someone", "blog");
        fixture_detect("/a/b", "https://example.com/a/b", "someone", "blog");
    }

    #[test]
    fn test_detect_base_path_unparseable() {
        fixture_detect("/blog", "not a url", "someone", "blog");
        fixture_detect("", "not a url", "someone", "someone");
        fixture_detect("", "not a url", "someone", "Someone.github.io");
    }

    #[test]
    fn test_rewrite_root_deployment() {
        assert_eq!(
            r#"<link href="/assets/main.css"><script src="/assets/main.js"></script><a href="/archives.html">"#,
            rewrite(
                r#"<link href="./assets/main.css"><script src="./assets/main.js"></script><a href="/archives.html">"#,
                ""
            )
        );
    }

    #[test]
    fn test_rewrite_sub_path() {
        let input = [
            r#"<link href="./assets/main.css">"#,
            r#"<script src="/assets/main.js"></script>"#,
            r#"<a href="/">Home</a> <a href="/archives.html">Archives</a>"#,
            r#"<a href="/search-data.json">data</a>"#,
            r#"fetch('/search-data.json')"#,
            r#"<a href="https://github.com/x.html">external</a>"#,
            r#"<a href="/blog/posts/1.html">already</a> <a href="/about.html">"#,
        ]
        .join("\n");
        let wanted = [
            r#"<link href="/blog/assets/main.css">"#,
            r#"<script src="/blog/assets/main.js"></script>"#,
            r#"<a href="/blog/">Home</a> <a href="/blog/archives.html">Archives</a>"#,
            r#"<a href="/blog/search-data.json">data</a>"#,
            r#"fetch('/blog/search-data.json')"#,
            r#"<a href="https://github.com/x.html">external</a>"#,
            r#"<a href="/blog/posts/1.html">already</a> <a href="/about.html">"#,
        ]
        .join("\n");
        assert_eq!(wanted, rewrite(&input, "/blog"));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let input = "<head>\n<link href=\"./assets/a.css\">\n</head>\n<a href=\"/\">x</a>\n<a href=\"/categories/rust.html\">";
        for base in ["", "/blog"] {
            let once = rewrite(input, base);
            assert_eq!(once, rewrite(&once, base));
        }
    }

    fn fixture_detect(wanted: &str, site_url: &str, owner: &str, repo: &str) {
        assert_eq!(wanted, detect_base_path(site_url, owner, repo), "site url {:?}", site_url);
    }
}
