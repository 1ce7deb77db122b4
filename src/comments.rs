//! Renders the third-party comment widget embedded at the bottom of post
//! pages. Each provider has a few mandatory settings; when they are missing
//! the page shows a notice pointing at the provider's setup page instead of a
//! broken widget.

use crate::post::Post;
use crate::template::escape_html;
use serde::Deserialize;

/// Gitalk rejects issue labels (its thread ids) longer than this.
const GITALK_MAX_ID_LENGTH: usize = 50;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    None,
    Giscus,
    Utterances,
    Gitalk,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CommentsConfig {
    pub enabled: bool,
    pub provider: Provider,
    pub giscus: GiscusConfig,
    pub utterances: UtterancesConfig,
    pub gitalk: GitalkConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GiscusConfig {
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,
    pub mapping: String,
    pub strict: String,
    pub reactions_enabled: String,
    pub emit_metadata: String,
    pub input_position: String,
    pub theme: String,
    pub lang: String,
}

impl Default for GiscusConfig {
    fn default() -> Self {
        GiscusConfig {
            repo: String::new(),
            repo_id: String::new(),
            category: String::new(),
            category_id: String::new(),
            mapping: String::from("pathname"),
            strict: String::from("0"),
            reactions_enabled: String::from("1"),
            emit_metadata: String::from("0"),
            input_position: String::from("bottom"),
            theme: String::from("preferred_color_scheme"),
            lang: String::from("zh-CN"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UtterancesConfig {
    pub repo: String,
    pub issue_term: String,
    pub label: String,
    pub theme: String,
}

impl Default for UtterancesConfig {
    fn default() -> Self {
        UtterancesConfig {
            repo: String::new(),
            issue_term: String::from("pathname"),
            label: String::new(),
            theme: String::from("github-light"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GitalkConfig {
    pub client_id: String,
    pub client_secret: String,
    pub repo: String,
    pub owner: String,
    pub admin: Vec<String>,
    /// `pathname` derives thread ids from the post URL; anything else uses
    /// `post-{id}`.
    pub id: String,
    pub distraction_free_mode: bool,
    pub language: String,
}

impl Default for GitalkConfig {
    fn default() -> Self {
        GitalkConfig {
            client_id: String::new(),
            client_secret: String::new(),
            repo: String::new(),
            owner: String::new(),
            admin: Vec::new(),
            id: String::from("pathname"),
            distraction_free_mode: false,
            language: String::from("zh-CN"),
        }
    }
}

/// Renders the comment section for `post`, or nothing when comments are
/// disabled.
pub fn render(config: &CommentsConfig, post: &Post) -> String {
    if !config.enabled {
        return String::new();
    }
    match config.provider {
        Provider::None => String::new(),
        Provider::Giscus => giscus(&config.giscus),
        Provider::Utterances => utterances(&config.utterances),
        Provider::Gitalk => gitalk(&config.gitalk, post),
    }
}

fn giscus(config: &GiscusConfig) -> String {
    if config.repo.is_empty() || config.repo_id.is_empty() || config.category_id.is_empty() {
        return incomplete("Giscus", "repo, repo_id and category_id", "https://giscus.app");
    }

    let attr = |name: &str, value: &str| format!(" data-{}=\"{}\"", name, escape_html(value));
    let attrs = [
        attr("repo", &config.repo),
        attr("repo-id", &config.repo_id),
        attr("category", &config.category),
        attr("category-id", &config.category_id),
        attr("mapping", &config.mapping),
        attr("strict", &config.strict),
        attr("reactions-enabled", &config.reactions_enabled),
        attr("emit-metadata", &config.emit_metadata),
        attr("input-position", &config.input_position),
        attr("theme", &config.theme),
        attr("lang", &config.lang),
    ]
    .concat();
    section(&format!(
        "<script src=\"https://giscus.app/client.js\"{} crossorigin=\"anonymous\" async></script>",
        attrs
    ))
}

fn utterances(config: &UtterancesConfig) -> String {
    if config.repo.is_empty() {
        return incomplete("Utterances", "repo", "https://utteranc.es");
    }

    section(&format!(
        "<script src=\"https://utteranc.es/client.js\" repo=\"{}\" issue-term=\"{}\" label=\"{}\" theme=\"{}\" crossorigin=\"anonymous\" async></script>",
        escape_html(&config.repo),
        escape_html(&config.issue_term),
        escape_html(&config.label),
        escape_html(&config.theme),
    ))
}

fn gitalk(config: &GitalkConfig, post: &Post) -> String {
    if config.client_id.is_empty() || config.client_secret.is_empty() {
        return incomplete(
            "Gitalk",
            "client_id and client_secret",
            "https://github.com/settings/applications/new",
        );
    }

    let key = match config.id.as_str() {
        "pathname" => post.url.clone(),
        _ => format!("post-{}", post.id),
    };
    // Values are emitted as JSON literals, which are valid JavaScript.
    let js = |value: &str| serde_json::Value::from(value).to_string();
    let admin = serde_json::Value::from(config.admin.clone()).to_string();

    section(&format!(
        concat!(
            "<div id=\"gitalk-container\"></div>\n",
            "<link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/gitalk@1/dist/gitalk.css\">\n",
            "<script src=\"https://cdn.jsdelivr.net/npm/gitalk@1/dist/gitalk.min.js\"></script>\n",
            "<script>\n",
            "new Gitalk({{ clientID: {}, clientSecret: {}, repo: {}, owner: {}, admin: {}, id: {}, ",
            "distractionFreeMode: {}, language: {} }}).render('gitalk-container');\n",
            "</script>",
        ),
        js(&config.client_id),
        js(&config.client_secret),
        js(&config.repo),
        js(&config.owner),
        admin,
        js(&thread_id(&key)),
        config.distraction_free_mode,
        js(&config.language),
    ))
}

fn section(widget: &str) -> String {
    format!(
        concat!(
            "<div class=\"comments-section\">\n",
            "<h3 class=\"comments-title\">Comments</h3>\n",
            "{}\n",
            "</div>",
        ),
        widget
    )
}

fn incomplete(provider: &str, fields: &str, setup_url: &str) -> String {
    format!(
        concat!(
            "<div class=\"comments-section comments-incomplete\">\n",
            "<p>{provider} comments are not fully configured.</p>\n",
            "<p>Set {fields} under <code>comments.{key}</code> in blog.yaml.</p>\n",
            "<p><a href=\"{url}\" target=\"_blank\" rel=\"noopener\">Get your {provider} settings</a></p>\n",
            "</div>",
        ),
        provider = provider,
        fields = fields,
        key = provider.to_lowercase(),
        url = setup_url,
    )
}

/// Derives a Gitalk thread id. This is the Java-style `h = h * 31 + c` hash
/// (written as `(h << 5) - h + c`) over UTF-16 code units with 32-bit
/// wrapping, rendered as the hex of its absolute value and truncated to
/// [`GITALK_MAX_ID_LENGTH`]. Deployed sites key existing threads on these
/// exact ids.
pub fn thread_id(key: &str) -> String {
    let hash = key.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });
    let mut id = format!("{:x}", hash.unsigned_abs());
    id.truncate(GITALK_MAX_ID_LENGTH);
    id
}
