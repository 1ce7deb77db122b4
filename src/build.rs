//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: fetching issues
//! ([`crate::github`]), preparing the output directory, transforming the
//! issues into posts ([`crate::post`]), indexing categories
//! ([`crate::category`]), and writing every page ([`crate::write`]).

use crate::category::Categories;
use crate::config::Config;
use crate::github::{self, Fetched};
use crate::markdown::Renderer;
use crate::post::{Post, Transformer};
use crate::template::Templates;
use crate::write::{Error as WriteError, Writer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where a build's posts came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched from the GitHub API.
    Live,

    /// The sample posts, substituted because the fetch failed.
    Fallback { reason: String },
}

/// Everything the page writer needs, computed once per build.
pub struct BuildContext {
    pub config: Config,
    pub base_path: String,
    pub source: DataSource,
    /// The posts in display order.
    pub posts: Vec<Post>,
    pub categories: Categories,
}

/// A summary of a finished build.
#[derive(Clone, Debug)]
pub struct BuildReport {
    pub source: DataSource,
    pub posts: usize,
    pub categories: usize,
    /// Post pages deleted because their issue is gone.
    pub removed: Vec<PathBuf>,
    pub output_directory: PathBuf,
}

/// Builds the site described by `config` into its output directory.
pub async fn build_site(config: Config) -> Result<BuildReport> {
    let output = config.build.output_directory.clone();
    tracing::info!(output = %output.display(), "building site");

    let fetched = fetch(&config).await;
    let source = match &fetched {
        Fetched::Live(_) => DataSource::Live,
        Fetched::Fallback { reason, .. } => {
            if config.build.strict_fetch {
                return Err(Error::FetchFailed {
                    reason: reason.clone(),
                });
            }
            DataSource::Fallback {
                reason: reason.clone(),
            }
        }
    };

    prepare_output(&config, &output)?;

    // Sample data says nothing about which issues exist, so never delete on a
    // fallback build.
    let removed = match fetched.is_live() {
        true => {
            let ids: HashSet<u64> = fetched.issues().iter().map(|i| i.number).collect();
            cleanup_orphans(&output.join("posts"), &ids)?
        }
        false => Vec::new(),
    };

    let ctx = context(config, source, &fetched.into_issues());
    let templates = Templates::load(&ctx.config.build.templates_directory);
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    Writer {
        config: &ctx.config,
        templates: &templates,
        base_path: &ctx.base_path,
        output_directory: &output,
        posts: &ctx.posts,
        categories: &ctx.categories,
    }
    .write_all(&today)?;

    let report = BuildReport {
        source: ctx.source,
        posts: ctx.posts.len(),
        categories: ctx.categories.len(),
        removed,
        output_directory: output,
    };
    tracing::info!(
        posts = report.posts,
        categories = report.categories,
        live = report.source == DataSource::Live,
        "build complete"
    );
    Ok(report)
}

async fn fetch(config: &Config) -> Fetched {
    match github::Client::new(&config.github, config.token.as_deref()) {
        Ok(client) => github::fetch(&client).await,
        Err(e) => {
            tracing::warn!(%e, "failed to create API client, using sample posts");
            Fetched::Fallback {
                issues: github::sample_issues(&config.github.owner, &config.github.repo),
                reason: e.to_string(),
            }
        }
    }
}

/// Transforms `issues` and indexes the resulting posts.
pub fn context(config: Config, source: DataSource, issues: &[github::Issue]) -> BuildContext {
    let base_path = config.base_path();
    tracing::info!(base_path = %base_path, "resolved base path");

    let posts = Transformer {
        base_path: &base_path,
        excerpt_length: config.build.excerpt_length,
        image_proxy: match config.image_proxy.enabled {
            true => Some(config.image_proxy.base_url.as_str()),
            false => None,
        },
        renderer: Renderer::new(),
    }
    .transform_all(issues);
    let categories = Categories::from_posts(&posts);

    BuildContext {
        config,
        base_path,
        source,
        posts,
        categories,
    }
}

/// Creates the output directory, replaces `assets/` with a fresh copy of the
/// assets directory, and clears the regenerated `page/` and `categories/`
/// directories. `posts/` is left alone; stale posts are removed by
/// [`cleanup_orphans`] once the issue list is known.
fn prepare_output(config: &Config, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output).map_err(|err| Error::Create {
        path: output.to_owned(),
        err,
    })?;

    rmdir(&output.join("page"))?;
    rmdir(&output.join("categories"))?;

    let assets = output.join("assets");
    rmdir(&assets)?;
    match config.build.assets_directory.is_dir() {
        true => copy_dir(&config.build.assets_directory, &assets)?,
        false => tracing::warn!(
            assets = %config.build.assets_directory.display(),
            "assets directory not found, skipping"
        ),
    }
    Ok(())
}

/// Deletes `{id}.html` files in `posts_dir` whose id isn't in `ids`. Files
/// that don't look like post pages are kept. Returns the deleted paths.
pub fn cleanup_orphans(posts_dir: &Path, ids: &HashSet<u64>) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(posts_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(Error::Io {
                path: posts_dir.to_owned(),
                err,
            })
        }
    };

    let mut removed = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| Error::Io {
                path: posts_dir.to_owned(),
                err,
            })?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let id = match path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(id) => id,
            None => continue,
        };
        if !ids.contains(&id) {
            std::fs::remove_file(&path).map_err(|err| Error::Io {
                path: path.clone(),
                err,
            })?;
            tracing::info!(path = %path.display(), "removed orphaned post page");
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| Error::OutsideRoot(entry.path().to_owned()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|err| Error::Create {
                path: target.clone(),
                err,
            })?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Create {
                path: target.clone(),
                err,
            })?;
        }
    }
    tracing::debug!(from = %src.display(), to = %dst.display(), "copied assets");
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the issues couldn't be fetched and `strict_fetch` is set.
    #[error("fetching issues failed: {reason}")]
    FetchFailed { reason: String },

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory '{}': {err}", .path.display())]
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems creating output files and directories.
    #[error("creating '{}': {err}", .path.display())]
    Create { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O problems, e.g. listing old post pages.
    #[error("'{}': {err}", .path.display())]
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when walking the assets directory fails.
    #[error("copying assets: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Returned when the asset walk yields a path outside the assets
    /// directory.
    #[error("asset '{}' is outside the assets directory", .0.display())]
    OutsideRoot(PathBuf),

    /// Returned for errors writing pages to disk.
    #[error(transparent)]
    Write(#[from] WriteError),
}
