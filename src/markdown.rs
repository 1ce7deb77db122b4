//! Converts issue bodies (GitHub-flavored markdown) into HTML. On top of
//! [`pulldown_cmark`]'s stock output, headings get slug `id`s for the
//! client-side table of contents and code blocks are wrapped with a language
//! label and a copy button and highlighted with [`syntect`].

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::template::escape_html;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

const COPY_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><rect x="9" y="9" width="13" height="13" rx="2" ry="2"></rect><path d="M5 15H4a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2h9a2 2 0 0 1 2 2v1"></path></svg>"#;

/// Renders markdown to HTML. Stateless; one instance serves a whole build.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    /// Converts `markdown` into an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let events = Parser::new_ext(markdown, options).map(|ev| match ev {
            // Issues are written with GitHub's line-break semantics.
            Event::SoftBreak => Event::HardBreak,
            ev => ev,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, EventConverter::new(events));
        out
    }
}

/// Buffers headings and code blocks and replaces each with a single
/// [`Event::Html`] carrying the customized markup. Everything else passes
/// through untouched.
struct EventConverter<'a, I> {
    inner: I,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a, I: Iterator<Item = Event<'a>>> EventConverter<'a, I> {
    fn new(inner: I) -> Self {
        EventConverter {
            inner,
            _marker: std::marker::PhantomData,
        }
    }

    fn convert_heading(&mut self, level: usize) -> Event<'a> {
        let mut inner: Vec<Event<'a>> = Vec::new();
        let mut text = String::new();
        for ev in self.inner.by_ref() {
            match ev {
                Event::End(Tag::Heading(..)) => break,
                Event::Text(ref t) | Event::Code(ref t) => {
                    text.push_str(t);
                    inner.push(ev);
                }
                ev => inner.push(ev),
            }
        }

        let mut body = String::new();
        html::push_html(&mut body, inner.into_iter());
        Event::Html(CowStr::from(format!(
            "<h{level} id=\"{id}\">{body}</h{level}>\n",
            level = level,
            id = escape_html(&heading_slug(&text)),
            body = body,
        )))
    }

    fn convert_code_block(&mut self, kind: CodeBlockKind<'a>) -> Event<'a> {
        let mut code = String::new();
        for ev in self.inner.by_ref() {
            match ev {
                Event::End(Tag::CodeBlock(_)) => break,
                Event::Text(t) => code.push_str(&t),
                _ => {}
            }
        }

        let lang = match kind {
            CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or("").to_owned(),
            CodeBlockKind::Indented => String::new(),
        };
        Event::Html(CowStr::from(code_block(&lang, &code)))
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for EventConverter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        match self.inner.next()? {
            Event::Start(Tag::Heading(level, _, _)) => Some(self.convert_heading(level as usize)),
            Event::Start(Tag::CodeBlock(kind)) => Some(self.convert_code_block(kind)),
            ev => Some(ev),
        }
    }
}

/// Derives a heading's `id`: lowercase, every run of characters other than
/// ASCII word characters and CJK ideographs becomes a single `-`, and
/// leading/trailing `-` are trimmed. Identical headings get identical ids.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || ('\u{4e00}'..='\u{9fa5}').contains(&c) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Renders a code block inside the copy-button wrapper.
fn code_block(lang: &str, code: &str) -> String {
    let lang_class = match lang.is_empty() {
        true => String::new(),
        false => format!(" class=\"language-{}\"", escape_html(lang)),
    };
    let label = match lang.is_empty() {
        true => "text",
        false => lang,
    };

    format!(
        concat!(
            "<div class=\"code-block-wrapper\">\n",
            "<div class=\"code-block-header\">",
            "<span class=\"code-block-lang\">{label}</span>",
            "<button class=\"code-copy-btn\" onclick=\"copyCode(this)\" title=\"Copy code\">{icon}</button>",
            "</div>\n",
            "<pre><code{class}>{code}</code></pre>\n",
            "</div>\n",
        ),
        label = escape_html(label),
        icon = COPY_ICON,
        class = lang_class,
        code = highlight(lang, code),
    )
}

/// Highlights `code` as `lang`. Without a known language only a shebang or
/// editor modeline on the first line picks a syntax; anything else comes out
/// as escaped plain text.
pub fn highlight(lang: &str, code: &str) -> String {
    let declared = match lang.is_empty() {
        true => None,
        false => SYNTAX_SET.find_syntax_by_token(lang),
    };
    if let Some(html) = declared.and_then(|syntax| highlight_with(syntax, code)) {
        return html;
    }

    let detected = code
        .lines()
        .next()
        .and_then(|line| SYNTAX_SET.find_syntax_by_first_line(line));
    match detected.and_then(|syntax| highlight_with(syntax, code)) {
        Some(html) => html,
        None => escape_html(code),
    }
}

fn highlight_with(syntax: &SyntaxReference, code: &str) -> Option<String> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(%e, syntax = %syntax.name, "highlighting failed");
            return None;
        }
    }
    Some(generator.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_heading_slug() {
        assert_eq!("hello-world", heading_slug("Hello, World!"));
        assert_eq!("特性", heading_slug("特性"));
        assert_eq!("rust-入门-guide", heading_slug("  Rust 入门 -- Guide?  "));
        assert_eq!("snake_case", heading_slug("snake_case"));
        assert_eq!("", heading_slug("!!!"));
    }

    #[test]
    fn test_heading_ids() {
        let html = Renderer::new().render("# 欢迎来到 Blog\n\n## Usage `cargo`\n\n## Usage `cargo`\n");
        assert!(html.contains(r#"<h1 id="欢迎来到-blog">欢迎来到 Blog</h1>"#), "{}", html);
        assert_eq!(
            2,
            html.matches(r#"<h2 id="usage-cargo">Usage <code>cargo</code></h2>"#).count(),
            "{}",
            html
        );
    }

    #[test]
    fn test_code_block_wrapper() {
        let html = Renderer::new().render("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<div class="code-block-wrapper">"#));
        assert!(html.contains(r#"<span class="code-block-lang">rust</span>"#));
        assert!(html.contains(r#"<pre><code class="language-rust">"#));
        assert!(html.contains("code-copy-btn"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_block_unknown_language() {
        let html = Renderer::new().render("```nosuchlang\na < b\n```\n");
        assert!(html.contains(r#"<span class="code-block-lang">nosuchlang</span>"#));
        assert!(html.contains("a &lt; b"), "{}", html);
    }

    #[test]
    fn test_indented_code_block_is_text() {
        let html = Renderer::new().render("para\n\n    <tag>\n");
        assert!(html.contains(r#"<span class="code-block-lang">text</span>"#));
        assert!(html.contains("<pre><code>"));
        assert!(html.contains("&lt;tag&gt;"), "{}", html);
    }

    #[test]
    fn test_soft_breaks_become_hard_breaks() {
        let html = Renderer::new().render("line one\nline two\n");
        assert!(html.contains("line one<br />"), "{}", html);
    }
}
