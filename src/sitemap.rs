//! Renders `sitemap.xml`.

use crate::category::Categories;
use crate::post::Post;
use crate::template::escape_html;
use std::fmt::Write;

/// The non-post, non-category pages listed in the sitemap.
const STATIC_PAGES: [&str; 3] = ["/archives.html", "/categories.html", "/search.html"];

/// Absolute URLs for the sitemap, derived from the configured site URL.
pub struct Site<'a> {
    /// The configured site URL; used verbatim for the home page entry.
    pub url: &'a str,
    /// `scheme://host[:port]` of [`Site::url`].
    pub origin: &'a str,
    pub base_path: &'a str,
}

/// Renders the sitemap. `today` (`YYYY-MM-DD`) is the `lastmod` of every
/// entry that isn't a post.
pub fn render(site: &Site, posts: &[Post], categories: &Categories, today: &str) -> String {
    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    ));

    url(&mut xml, site.url, today, "daily", "1.0");
    for page in STATIC_PAGES {
        let loc = format!("{}{}{}", site.origin, site.base_path, page);
        url(&mut xml, &loc, today, "weekly", "0.8");
    }
    for post in posts {
        let loc = format!("{}{}", site.origin, post.url);
        url(&mut xml, &loc, &post.updated_date(), "monthly", "0.7");
    }
    for category in categories.iter() {
        let loc = format!("{}{}", site.origin, category.url(site.base_path));
        url(&mut xml, &loc, today, "weekly", "0.6");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    let _ = write!(
        xml,
        concat!(
            "  <url>\n",
            "    <loc>{}</loc>\n",
            "    <lastmod>{}</lastmod>\n",
            "    <changefreq>{}</changefreq>\n",
            "    <priority>{}</priority>\n",
            "  </url>\n",
        ),
        escape_html(loc),
        lastmod,
        changefreq,
        priority
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::{issue, transformer};
    use crate::post::Transformer;

    #[test]
    fn test_render() {
        let posts = Transformer {
            base_path: "/blog",
            ..transformer()
        }
        .transform_all(&[issue(1, 1, &["博客"]), issue(2, 2, &[])]);
        let categories = Categories::from_posts(&posts);
        let site = Site {
            url: "https://example.org/blog/",
            origin: "https://example.org",
            base_path: "/blog",
        };
        let xml = render(&site, &posts, &categories, "2024-06-01");

        assert!(xml.starts_with("<?xml"));
        assert_eq!(1 + 3 + 2 + 1, xml.matches("<url>").count());
        assert!(xml.contains("<loc>https://example.org/blog/</loc>\n    <lastmod>2024-06-01</lastmod>\n    <changefreq>daily</changefreq>\n    <priority>1.0</priority>"));
        assert!(xml.contains("<loc>https://example.org/blog/search.html</loc>"));
        assert!(xml.contains("<loc>https://example.org/blog/posts/1.html</loc>\n    <lastmod>2024-01-01</lastmod>\n    <changefreq>monthly</changefreq>\n    <priority>0.7</priority>"));
        assert!(xml.contains("<loc>https://example.org/blog/categories/bo-ke.html</loc>\n    <lastmod>2024-06-01</lastmod>\n    <changefreq>weekly</changefreq>\n    <priority>0.6</priority>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_escapes_locations() {
        let site = Site {
            url: "https://example.org/?a=1&b=2",
            origin: "https://example.org",
            base_path: "",
        };
        let xml = render(&site, &[], &Categories::default(), "2024-06-01");
        assert!(xml.contains("<loc>https://example.org/?a=1&amp;b=2</loc>"));
    }
}
