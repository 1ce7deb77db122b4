//! Loads the project configuration (`blog.yaml`) and applies the environment
//! overrides used by CI deployments (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`).

use crate::comments::CommentsConfig;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "blog.yaml";

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_PROXY_URL: &str = "https://images.weserv.nl/?url=";

/// Site metadata, substituted into every page as `{{site.*}}`.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,
    pub avatar: String,
    /// The public URL of the site. Its path component determines the base
    /// path for sub-directory deployments.
    pub url: String,
    pub date: String,
    pub favicon: String,
}

/// Identifies the repository whose issues become posts.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    /// The REST API root. Overridable so tests can point at a mock server.
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            owner: String::new(),
            repo: String::new(),
            api_url: DEFAULT_API_URL.to_owned(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BuildConfig {
    /// The number of posts per index page.
    pub posts_per_page: usize,

    /// The maximum number of characters in a post excerpt.
    pub excerpt_length: usize,

    pub output_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub assets_directory: PathBuf,

    /// Fail the build rather than falling back to sample posts when the
    /// issues can't be fetched.
    pub strict_fetch: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            posts_per_page: 10,
            excerpt_length: 150,
            output_directory: PathBuf::from("dist"),
            templates_directory: PathBuf::from("templates"),
            assets_directory: PathBuf::from("assets"),
            strict_fetch: false,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ImageProxyConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for ImageProxyConfig {
    fn default() -> Self {
        ImageProxyConfig {
            enabled: false,
            base_url: DEFAULT_PROXY_URL.to_owned(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct SeoConfig {
    pub keywords: Vec<String>,
    pub generate_sitemap: bool,
    pub generate_feed: bool,
}

/// The complete project configuration.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub github: GithubConfig,
    pub build: BuildConfig,
    pub image_proxy: ImageProxyConfig,
    pub seo: SeoConfig,
    pub comments: CommentsConfig,

    /// The API token, taken from `GITHUB_TOKEN`. Never read from the project
    /// file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Config {
    /// Searches `dir` and each of its ancestors for [`PROJECT_FILE`] and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the configuration from `path`. Relative directories in the
    /// `build` section are resolved against the directory containing the
    /// project file, and environment overrides are applied.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let mut config: Config = serde_yaml::from_reader(file)?;
        let root = path.parent().ok_or_else(|| Error::NoParent(path.to_owned()))?;
        config.resolve_paths(root);
        config.apply_env(
            std::env::var("GITHUB_TOKEN").ok().as_deref(),
            std::env::var("GITHUB_REPOSITORY").ok().as_deref(),
        );
        Ok(config)
    }

    /// Joins the relative `build` directories onto `root` and clamps the page
    /// size to at least one post.
    pub fn resolve_paths(&mut self, root: &Path) {
        let build = &mut self.build;
        for dir in [
            &mut build.output_directory,
            &mut build.templates_directory,
            &mut build.assets_directory,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        build.posts_per_page = build.posts_per_page.max(1);
    }

    /// Applies the CI overrides. `repository` has the `owner/repo` form
    /// GitHub Actions uses; a malformed value is ignored.
    pub fn apply_env(&mut self, token: Option<&str>, repository: Option<&str>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = Some(token.to_owned());
        }
        if let Some((owner, repo)) = repository.and_then(|r| r.split_once('/')) {
            if !owner.is_empty() && !repo.is_empty() {
                self.github.owner = owner.to_owned();
                self.github.repo = repo.to_owned();
            }
        }
    }

    /// The URL prefix for a sub-directory deployment (see
    /// [`crate::paths::detect_base_path`]).
    pub fn base_path(&self) -> String {
        crate::paths::detect_base_path(&self.site.url, &self.github.owner, &self.github.repo)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no project file exists in the directory or any ancestor.
    #[error("could not find `blog.yaml` in any parent directory")]
    NotFound,

    /// Returned when the project file can't be opened.
    #[error("opening project file '{}': {err}", .path.display())]
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file path has no parent directory.
    #[error("can't get parent directory for project file '{}'", .0.display())]
    NoParent(PathBuf),

    /// Returned when the project file isn't valid YAML for [`Config`].
    #[error("parsing project file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() -> std::result::Result<(), serde_yaml::Error> {
        let config: Config = serde_yaml::from_str("site:\n  title: Blog\n")?;
        assert_eq!("Blog", config.site.title);
        assert_eq!(10, config.build.posts_per_page);
        assert_eq!(150, config.build.excerpt_length);
        assert_eq!(DEFAULT_API_URL, config.github.api_url);
        assert_eq!(DEFAULT_PROXY_URL, config.image_proxy.base_url);
        assert!(!config.image_proxy.enabled);
        assert!(!config.build.strict_fetch);
        Ok(())
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config.github.owner = String::from("someone");
        config.github.repo = String::from("blog");

        config.apply_env(Some(""), Some("malformed"));
        assert_eq!(None, config.token);
        assert_eq!("someone", config.github.owner);

        config.apply_env(Some("secret"), Some("octocat/notes"));
        assert_eq!(Some("secret"), config.token.as_deref());
        assert_eq!("octocat", config.github.owner);
        assert_eq!("notes", config.github.repo);
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let root = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::from("tempdir"),
            err,
        })?;
        std::fs::write(
            root.path().join(PROJECT_FILE),
            "build:\n  posts_per_page: 0\n  output_directory: public\n",
        )
        .map_err(|err| Error::Open {
            path: root.path().to_owned(),
            err,
        })?;
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).map_err(|err| Error::Open {
            path: nested.clone(),
            err,
        })?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(1, config.build.posts_per_page);
        assert_eq!(root.path().join("public"), config.build.output_directory);
        assert_eq!(root.path().join("templates"), config.build.templates_directory);
        Ok(())
    }
}
