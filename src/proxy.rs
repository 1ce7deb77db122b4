//! Routes images embedded in issue bodies through an image proxy (e.g.
//! `https://images.weserv.nl/?url=`), which works around hosts that block
//! hotlinking or are unreachable from some regions.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use url::Url;

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static HTML_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img([^>]*?)src=["']([^"']+)["']([^>]*?)>"#).unwrap());

/// Rewrites markdown images (`![alt](url)`) and HTML `<img src="url">` tags
/// in `content` so that http(s) URLs are fetched via `base_url`. URLs that
/// already point at the proxy host or at any `weserv.nl` host, and non-http(s)
/// URLs, are unchanged.
pub fn proxy_images<'a>(content: &'a str, base_url: &str) -> Cow<'a, str> {
    let proxy = host(base_url);
    let proxied = |url: &str| -> Option<String> {
        let already_proxied = url.starts_with(base_url)
            || host(url).map_or(false, |h| Some(&h) == proxy.as_ref() || is_weserv(&h));
        let http = url.starts_with("http://") || url.starts_with("https://");
        match !already_proxied && http {
            true => Some(format!("{}{}", base_url, url)),
            false => None,
        }
    };

    let content = MARKDOWN_IMAGE.replace_all(content, |caps: &Captures| match proxied(&caps[2]) {
        Some(url) => format!("![{}]({})", &caps[1], url),
        None => caps[0].to_owned(),
    });

    let rewritten = match HTML_IMAGE.replace_all(&content, |caps: &Captures| match proxied(&caps[2]) {
        Some(url) => format!("<img{}src=\"{}\"{}>", &caps[1], url, &caps[3]),
        None => caps[0].to_owned(),
    }) {
        Cow::Borrowed(_) => None,
        Cow::Owned(rewritten) => Some(rewritten),
    };
    match rewritten {
        Some(rewritten) => Cow::Owned(rewritten),
        None => content,
    }
}

fn host(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_ascii_lowercase)
}

/// `images.weserv.nl`, `wsrv.weserv.nl` and friends all serve the same proxy.
fn is_weserv(host: &str) -> bool {
    host == "weserv.nl" || host.ends_with(".weserv.nl")
}

#[cfg(test)]
mod test {
    use super::*;

    const WESERV: &str = "https://images.weserv.nl/?url=";

    #[test]
    fn test_markdown_image() {
        assert_eq!(
            "![alt](https://images.weserv.nl/?url=http://x.com/a.png)",
            proxy_images("![alt](http://x.com/a.png)", WESERV)
        );
    }

    #[test]
    fn test_already_proxied() {
        let input = "![alt](https://wsrv.weserv.nl/?url=http://x.com/a.png)";
        assert_eq!(input, proxy_images(input, WESERV));
        let input = "![alt](https://images.weserv.nl/?url=http://x.com/a.png)";
        assert_eq!(input, proxy_images(input, WESERV));
    }

    #[test]
    fn test_shared_public_suffix_still_proxied() {
        let proxy = "https://img.example.co.uk/?url=";
        assert_eq!(
            "![a](https://img.example.co.uk/?url=https://photos.other.co.uk/a.png)",
            proxy_images("![a](https://photos.other.co.uk/a.png)", proxy)
        );
        let input = "![a](https://img.example.co.uk/cached/a.png)";
        assert_eq!(input, proxy_images(input, proxy));
    }

    #[test]
    fn test_non_http_unchanged() {
        let input = "![a](./local.png) ![b](data:image/png;base64,xx) <img src=\"/c.png\">";
        assert_eq!(input, proxy_images(input, WESERV));
    }

    #[test]
    fn test_html_image() {
        assert_eq!(
            r#"<p><img alt="x" src="https://images.weserv.nl/?url=https://x.com/a.png" width="10"></p>"#,
            proxy_images(r#"<p><img alt="x" src='https://x.com/a.png' width="10"></p>"#, WESERV)
        );
    }

    #[test]
    fn test_mixed() {
        assert_eq!(
            "text ![](https://p.example/?u=https://a.com/1.png) and <img src=\"https://p.example/?u=http://b.com/2.gif\">",
            proxy_images(
                "text ![](https://a.com/1.png) and <img src=\"http://b.com/2.gif\">",
                "https://p.example/?u="
            )
        );
    }
}
