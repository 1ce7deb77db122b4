//! Sanity checks for a built site before it is deployed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static PAGE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*\.html)""#).unwrap());
static STYLESHEET: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*\.css)""#).unwrap());

/// Files and directories every deployable site must contain.
pub const CRITICAL_FILES: [&str; 4] = ["index.html", "search-data.json", "posts", "assets"];

/// A critical file that exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Present {
    pub file: &'static str,
    /// The size in bytes, or `None` for directories.
    pub size: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    pub output_directory: PathBuf,
    pub present: Vec<Present>,
    pub missing: Vec<&'static str>,
    /// Stylesheet references in `index.html`.
    pub stylesheets: Vec<String>,
    /// Page links (`href="….html"`) in `index.html`, in document order.
    pub links: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    /// Logs the report, one line per finding.
    pub fn log(&self) {
        for present in self.present.iter() {
            match present.size {
                Some(size) => tracing::info!(file = present.file, size, "found"),
                None => tracing::info!(file = present.file, "found directory"),
            }
        }
        for missing in self.missing.iter() {
            tracing::error!(file = missing, "missing");
        }
        for stylesheet in self.stylesheets.iter() {
            tracing::info!(stylesheet = %stylesheet, "index.html stylesheet");
        }
        for link in self.links.iter() {
            tracing::info!(link = %link, "index.html link");
        }
    }
}

/// Checks `output_directory` for the [`CRITICAL_FILES`] and collects the
/// links in its `index.html`.
pub fn check(output_directory: &Path) -> CheckReport {
    let mut report = CheckReport {
        output_directory: output_directory.to_owned(),
        ..CheckReport::default()
    };

    for file in CRITICAL_FILES {
        match std::fs::metadata(output_directory.join(file)) {
            Ok(metadata) => report.present.push(Present {
                file,
                size: match metadata.is_dir() {
                    true => None,
                    false => Some(metadata.len()),
                },
            }),
            Err(_) => report.missing.push(file),
        }
    }

    if let Ok(index) = std::fs::read_to_string(output_directory.join("index.html")) {
        let captures = |re: &Regex| -> Vec<String> {
            re.captures_iter(&index).map(|c| c[1].to_owned()).collect()
        };
        report.stylesheets = captures(&*STYLESHEET);
        report.links = captures(&*PAGE_LINK);
    }
    report
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_complete_site() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("posts")).unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("search-data.json"), "[]").unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<link href="/blog/assets/main.css"><a href="/blog/archives.html"></a><a href="/blog/posts/1.html"></a><a href="https://github.com">"#,
        )
        .unwrap();

        let report = check(dir.path());
        assert!(report.is_ok());
        assert_eq!(4, report.present.len());
        assert_eq!(Present { file: "search-data.json", size: Some(2) }, report.present[1]);
        assert_eq!(None, report.present[2].size);
        assert_eq!(vec!["/blog/assets/main.css"], report.stylesheets);
        assert_eq!(vec!["/blog/archives.html", "/blog/posts/1.html"], report.links);
    }

    #[test]
    fn test_check_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "").unwrap();
        let report = check(dir.path());
        assert!(!report.is_ok());
        assert_eq!(vec!["search-data.json", "posts", "assets"], report.missing);
        assert!(report.links.is_empty());
    }

    #[test]
    fn test_check_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = check(&dir.path().join("dist"));
        assert_eq!(CRITICAL_FILES.to_vec(), report.missing);
    }
}
