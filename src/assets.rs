//! Built-asset resolution and static file sync.
//!
//! Sites bundled with a build tool leave behind a JSON manifest mapping
//! source entry points to hashed output files. [`BuiltAssets::resolve`]
//! reads that manifest to find the stylesheet/script pair for the main page
//! and for article pages; when the manifest is missing or unreadable the
//! unbundled development paths are used instead, so a dev build still
//! produces working pages.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::{info, warn};

/// One entry of the build manifest. Only the fields the resolver needs.
#[derive(Clone, Debug, Default, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    file: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    css: Vec<String>,
}

/// A stylesheet/script pair for one kind of page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetEntry {
    pub css: Option<String>,
    pub js: Option<String>,
}

/// The resolved asset paths handed to templates as `builtResources`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuiltAssets {
    pub main: AssetEntry,
    pub article: AssetEntry,
}

impl BuiltAssets {
    /// The unbundled source paths used when no manifest is available.
    pub fn dev_defaults() -> BuiltAssets {
        BuiltAssets {
            main: AssetEntry {
                css: Some("src/styles/main.css".to_owned()),
                js: Some("src/js/main.js".to_owned()),
            },
            article: AssetEntry {
                css: Some("src/styles/components/article.css".to_owned()),
                js: Some("src/js/article.js".to_owned()),
            },
        }
    }

    /// Resolves asset paths from the configured manifest, falling back to
    /// [`dev_defaults`](BuiltAssets::dev_defaults) when the site has no
    /// manifest or it cannot be read.
    pub fn resolve(manifest_file: Option<&Path>) -> BuiltAssets {
        let path = match manifest_file {
            None => return BuiltAssets::dev_defaults(),
            Some(path) => path,
        };
        let text = match fs::read_to_string(path) {
            Err(err) => {
                warn!(
                    "reading asset manifest `{}`: {}; using development asset paths",
                    path.display(),
                    err
                );
                return BuiltAssets::dev_defaults();
            }
            Ok(text) => text,
        };
        match serde_json::from_str::<BTreeMap<String, ManifestEntry>>(&text) {
            Err(err) => {
                warn!(
                    "parsing asset manifest `{}`: {}; using development asset paths",
                    path.display(),
                    err
                );
                BuiltAssets::dev_defaults()
            }
            Ok(manifest) => BuiltAssets::from_manifest(&manifest),
        }
    }

    /// Article pages prefer entries named `article*`; the `index.html` entry
    /// backs both the main pair and the article fallback.
    fn from_manifest(manifest: &BTreeMap<String, ManifestEntry>) -> BuiltAssets {
        let index = manifest.get("index.html");
        let main_css = index
            .and_then(|entry| entry.css.first())
            .map(|file| format!("/{}", file));
        let main_js = index
            .map(|entry| entry.file.as_str())
            .filter(|file| !file.is_empty())
            .map(|file| format!("/{}", file));

        // Stylesheet entries carry `article` names too; they must never win
        // the script slot.
        let article_js = manifest
            .iter()
            .find(|(key, entry)| {
                !key.ends_with(".css")
                    && (key.starts_with("src/js/article.js")
                        || entry
                            .name
                            .as_deref()
                            .is_some_and(|name| name.starts_with("article")))
            })
            .map(|(_, entry)| format!("/{}", entry.file));
        let article_css = manifest
            .iter()
            .find(|(key, entry)| {
                key.ends_with(".css")
                    && entry
                        .name
                        .as_deref()
                        .is_some_and(|name| name.starts_with("article"))
            })
            .map(|(_, entry)| format!("/{}", entry.file));

        BuiltAssets {
            article: AssetEntry {
                css: article_css.or_else(|| main_css.clone()),
                js: article_js.or_else(|| main_js.clone()),
            },
            main: AssetEntry {
                css: main_css,
                js: main_js,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
}

/// Copies the static asset tree under `static_dir` into `output_dir`,
/// preserving directory structure. A missing source directory is a no-op.
/// Failing to create a target directory aborts the sync; a file that cannot
/// be copied is warned about, counted as skipped, and the sync continues.
pub fn sync_static(static_dir: &Path, output_dir: &Path) -> Result<CopyStats> {
    if !static_dir.is_dir() {
        info!(
            "no static directory at `{}`; nothing to sync",
            static_dir.display()
        );
        return Ok(CopyStats::default());
    }

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(static_dir) {
        let entry = entry.map_err(Error::Walk)?;
        let relative = match entry.path().strip_prefix(static_dir) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = output_dir.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|err| Error::CreateDir {
                path: target.clone(),
                err,
            })?;
        } else if entry.file_type().is_file() {
            match fs::copy(entry.path(), &target) {
                Ok(_) => stats.copied += 1,
                Err(err) => {
                    warn!(
                        "copying `{}` to `{}`: {}",
                        entry.path().display(),
                        target.display(),
                        err
                    );
                    stats.skipped += 1;
                }
            }
        }
    }
    info!(
        "synced {} static files into `{}`",
        stats.copied,
        output_dir.display()
    );
    Ok(stats)
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("walking static directory: {0}")]
    Walk(#[source] walkdir::Error),

    #[error("creating output directory `{path}`: {err}")]
    CreateDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_no_manifest_uses_dev_paths() {
        assert_eq!(BuiltAssets::resolve(None), BuiltAssets::dev_defaults());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("manifest.json");
        assert_eq!(
            BuiltAssets::resolve(Some(&missing)),
            BuiltAssets::dev_defaults()
        );
    }

    #[test]
    fn test_manifest_resolves_article_entries() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"{
                "index.html": {
                    "file": "assets/index-abc123.js",
                    "css": ["assets/index-abc123.css"]
                },
                "src/js/article.js": {
                    "file": "assets/article-def456.js",
                    "name": "article"
                },
                "article.css": {
                    "file": "assets/article-def456.css",
                    "name": "article"
                }
            }"#,
        )
        .unwrap();

        let assets = BuiltAssets::resolve(Some(&manifest));
        assert_eq!(assets.main.css.as_deref(), Some("/assets/index-abc123.css"));
        assert_eq!(assets.main.js.as_deref(), Some("/assets/index-abc123.js"));
        assert_eq!(
            assets.article.css.as_deref(),
            Some("/assets/article-def456.css")
        );
        assert_eq!(
            assets.article.js.as_deref(),
            Some("/assets/article-def456.js")
        );
    }

    #[test]
    fn test_article_entries_fall_back_to_index() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"{
                "index.html": {
                    "file": "assets/index-abc123.js",
                    "css": ["assets/index-abc123.css"]
                }
            }"#,
        )
        .unwrap();

        let assets = BuiltAssets::resolve(Some(&manifest));
        assert_eq!(
            assets.article.css.as_deref(),
            Some("/assets/index-abc123.css")
        );
        assert_eq!(assets.article.js.as_deref(), Some("/assets/index-abc123.js"));
    }

    #[test]
    fn test_broken_manifest_uses_dev_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(&manifest, "{not json").unwrap();
        assert_eq!(
            BuiltAssets::resolve(Some(&manifest)),
            BuiltAssets::dev_defaults()
        );
    }

    #[test]
    fn test_sync_copies_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("static");
        fs::create_dir_all(source.join("css")).unwrap();
        fs::write(source.join("css/site.css"), "body {}").unwrap();
        fs::write(source.join("robots.txt"), "User-agent: *").unwrap();
        let output = dir.path().join("public");

        let stats = sync_static(&source, &output).unwrap();
        assert_eq!(stats, CopyStats { copied: 2, skipped: 0 });
        assert_eq!(
            fs::read_to_string(output.join("css/site.css")).unwrap(),
            "body {}"
        );
        assert!(output.join("robots.txt").is_file());
    }

    #[test]
    fn test_sync_without_source_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let stats = sync_static(&dir.path().join("static"), &dir.path().join("public")).unwrap();
        assert_eq!(stats, CopyStats::default());
        assert!(!dir.path().join("public").exists());
    }
}
