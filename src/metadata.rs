//! The consolidated metadata index. [`MetadataGenerator`] scans the document
//! directory for supported source files, derives a [`PostRecord`] per file
//! (in parallel), drops drafts, sorts by date descending, groups posts by
//! category and tag, and writes the whole index as JSON. Individual bad
//! files are skipped with a warning; only the final write can fail the run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::article;
use crate::config::Config;
use crate::frontmatter;
use crate::{debug, info, warn};

/// Everything the index records about a single post. `date` defaults to the
/// generation day, `lastmod` to `date`, `description` to the excerpt, and
/// `cover` to the site-wide default cover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostRecord {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub lastmod: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub excerpt: String,
    pub description: String,
    pub cover: String,
    pub read_time: String,
    pub word_count: usize,
    /// Source file name, the key the post generator looks records up by.
    pub file_name: String,
    pub draft: bool,
}

impl Default for PostRecord {
    fn default() -> PostRecord {
        PostRecord {
            slug: String::new(),
            title: String::new(),
            date: String::new(),
            lastmod: String::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            excerpt: String::new(),
            description: String::new(),
            cover: String::new(),
            read_time: String::new(),
            word_count: 0,
            file_name: String::new(),
            draft: false,
        }
    }
}

/// The consolidated index as written to the configured `metadataFile`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataIndex {
    pub generated_at: String,
    pub post_count: usize,
    pub posts: Vec<PostRecord>,
    /// Category name to post slugs, in post (date-descending) order.
    pub categories: BTreeMap<String, Vec<String>>,
    /// Tag name to post slugs, in post (date-descending) order.
    pub tags: BTreeMap<String, Vec<String>>,
}

impl MetadataIndex {
    /// Reads a previously written index. A missing or unparseable file is
    /// not fatal; downstream consumers fall back to per-file derivation.
    pub fn load(path: &Path) -> Option<MetadataIndex> {
        let text = match fs::read_to_string(path) {
            Err(err) => {
                warn!(
                    "reading metadata index `{}`: {}; continuing without it",
                    path.display(),
                    err
                );
                return None;
            }
            Ok(text) => text,
        };
        match serde_json::from_str(&text) {
            Err(err) => {
                warn!(
                    "parsing metadata index `{}`: {}; continuing without it",
                    path.display(),
                    err
                );
                None
            }
            Ok(index) => Some(index),
        }
    }

    /// Looks up the record for a source file name.
    pub fn find(&self, file_name: &str) -> Option<&PostRecord> {
        self.posts.iter().find(|post| post.file_name == file_name)
    }
}

pub struct MetadataGenerator<'a> {
    config: &'a Config,
}

impl<'a> MetadataGenerator<'a> {
    pub fn new(config: &'a Config) -> MetadataGenerator<'a> {
        MetadataGenerator { config }
    }

    /// Builds the index and writes it to the configured path. When no posts
    /// survive scanning, the empty index is returned without touching the
    /// output file.
    pub fn generate(&self) -> Result<MetadataIndex> {
        let doc_dir = &self.config.paths.doc_dir;
        let file_names = self.scan(doc_dir);
        info!(
            "scanning {} source files in `{}`",
            file_names.len(),
            doc_dir.display()
        );

        // Drafts are derived like any other record, then dropped before the
        // index is assembled.
        let mut posts: Vec<PostRecord> = file_names
            .par_iter()
            .filter_map(|name| self.record_from_file(&doc_dir.join(name), name))
            .filter(|record| {
                if record.draft {
                    debug!("excluding draft `{}`", record.file_name);
                }
                !record.draft
            })
            .collect();
        // Stable sort, so same-day posts keep file-name order.
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for post in &posts {
            for category in &post.categories {
                categories
                    .entry(category.clone())
                    .or_default()
                    .push(post.slug.clone());
            }
            for tag in &post.tags {
                tags.entry(tag.clone()).or_default().push(post.slug.clone());
            }
        }

        let index = MetadataIndex {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            post_count: posts.len(),
            posts,
            categories,
            tags,
        };

        if index.post_count == 0 {
            info!(
                "no posts found in `{}`; metadata index not written",
                doc_dir.display()
            );
            return Ok(index);
        }
        self.write(&index)?;
        Ok(index)
    }

    /// Supported source file names in `doc_dir`, sorted for determinism. A
    /// missing or unreadable directory yields an empty scan.
    fn scan(&self, doc_dir: &Path) -> Vec<String> {
        let entries = match fs::read_dir(doc_dir) {
            Err(err) => {
                warn!(
                    "reading document directory `{}`: {}",
                    doc_dir.display(),
                    err
                );
                return Vec::new();
            }
            Ok(entries) => entries,
        };
        let mut file_names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .filter(|name| self.config.file_config.is_supported(name))
            .collect();
        file_names.sort();
        file_names
    }

    fn record_from_file(&self, path: &Path, file_name: &str) -> Option<PostRecord> {
        let text = match fs::read_to_string(path) {
            Err(err) => {
                warn!("skipping `{}`: {}", path.display(), err);
                return None;
            }
            Ok(text) => text,
        };
        let document = match frontmatter::parse(&text) {
            Err(err) => {
                warn!("skipping `{}`: {}", path.display(), err);
                return None;
            }
            Ok(document) => document,
        };
        let front_matter = &document.front_matter;
        let body = &document.body;
        let today = Local::now().format("%Y-%m-%d").to_string();
        let date = front_matter.date.clone().unwrap_or_else(|| today.clone());
        let lastmod = front_matter
            .lastmod
            .clone()
            .or_else(|| front_matter.date.clone())
            .unwrap_or(today);
        let excerpt = article::extract_excerpt(body, front_matter);
        Some(PostRecord {
            slug: article::slug_from_filename(file_name),
            title: article::extract_title(front_matter, body, file_name),
            date,
            lastmod,
            tags: front_matter.tags.clone(),
            categories: front_matter.categories.clone(),
            description: front_matter
                .description
                .clone()
                .unwrap_or_else(|| excerpt.clone()),
            excerpt,
            cover: front_matter
                .cover
                .clone()
                .unwrap_or_else(|| self.config.site.default_cover.clone()),
            read_time: article::read_time(body),
            word_count: article::word_count(body),
            file_name: file_name.to_owned(),
            draft: front_matter.draft,
        })
    }

    fn write(&self, index: &MetadataIndex) -> Result<()> {
        let path = &self.config.paths.metadata_file;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::CreateDir {
                path: parent.to_owned(),
                err,
            })?;
        }
        let json = serde_json::to_string_pretty(index).map_err(Error::Serialize)?;
        fs::write(path, json).map_err(|err| Error::Write {
            path: path.clone(),
            err,
        })?;
        info!(
            "wrote metadata for {} posts to `{}`",
            index.post_count,
            path.display()
        );
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to write the finished index. Per-file problems are
/// never errors; they degrade to warnings and a smaller index.
#[derive(Debug, Error)]
pub enum Error {
    #[error("creating metadata directory `{path}`: {err}")]
    CreateDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("serializing metadata index: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("writing metadata index `{path}`: {err}")]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
