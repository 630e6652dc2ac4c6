//! Renders one HTML page per source document. The generator loads the
//! metadata index and the asset manifest up front, tolerating the absence of
//! either, then fans the per-file work out over a parallel iterator. A file
//! that cannot be processed is logged and counted; it never stops the run.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use gtmpl::Value;
use rayon::prelude::*;
use thiserror::Error;

use crate::article;
use crate::assets::BuiltAssets;
use crate::config::Config;
use crate::frontmatter::{self, FrontMatter};
use crate::markdown;
use crate::metadata::{MetadataIndex, PostRecord};
use crate::template::{self, TemplateManager};
use crate::toc;
use crate::value;
use crate::{debug, error, info, warn};

/// Success/failure accounting for one generation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

pub struct PostGenerator<'a> {
    config: &'a Config,
    templates: TemplateManager,
    metadata: Option<MetadataIndex>,
    assets: BuiltAssets,
}

impl<'a> PostGenerator<'a> {
    pub fn new(config: &'a Config) -> Result<PostGenerator<'a>> {
        let templates = TemplateManager::new(config)?;
        debug!("loaded templates: {}", templates.available().join(", "));
        let metadata = MetadataIndex::load(&config.paths.metadata_file);
        if metadata.is_none() {
            info!("no metadata index; run the metadata generator for richer post data");
        }
        let assets = BuiltAssets::resolve(config.paths.manifest_file.as_deref());
        Ok(PostGenerator {
            config,
            templates,
            metadata,
            assets,
        })
    }

    /// Renders every supported source document into the post directory.
    pub fn generate(&self) -> Result<Summary> {
        let post_dir = &self.config.paths.post_dir;
        fs::create_dir_all(post_dir).map_err(|err| Error::CreateDir {
            path: post_dir.clone(),
            err,
        })?;

        let file_names = self.scan();
        if file_names.is_empty() {
            info!(
                "no source documents in `{}`",
                self.config.paths.doc_dir.display()
            );
            return Ok(Summary::default());
        }

        let results: Vec<(String, Result<String>)> = file_names
            .par_iter()
            .map(|name| (name.clone(), self.process_file(name)))
            .collect();

        let mut summary = Summary {
            total: results.len(),
            ..Summary::default()
        };
        for (name, result) in results {
            match result {
                Ok(output) => {
                    debug!("{} -> {}", name, output);
                    summary.succeeded += 1;
                }
                Err(err) => {
                    error!("processing `{}`: {}", name, err);
                    summary.failed += 1;
                }
            }
        }
        info!(
            "generated {} of {} pages ({} failed)",
            summary.succeeded, summary.total, summary.failed
        );
        Ok(summary)
    }

    /// Renders a single source document; returns the output file name.
    pub fn process_file(&self, file_name: &str) -> Result<String> {
        let source = self.config.paths.doc_dir.join(file_name);
        let text = fs::read_to_string(&source).map_err(|err| Error::ReadSource {
            path: source.clone(),
            err,
        })?;
        let document = frontmatter::parse(&text).map_err(|err| Error::FrontMatter {
            file: file_name.to_owned(),
            err,
        })?;
        let record = self
            .metadata
            .as_ref()
            .and_then(|index| index.find(file_name));

        let toc_html = toc::render(&document.body);
        let html = markdown::to_html(&document.body, &self.config.markdown_config);
        let data = self.template_data(&document.front_matter, &document.body, file_name, record, toc_html, html);

        let page = self
            .templates
            .render("", data)
            .map_err(|err| Error::Render {
                file: file_name.to_owned(),
                err,
            })?;

        let output_name = output_file_name(file_name, &self.config.file_config.output_extension);
        let target = self.config.paths.post_dir.join(&output_name);
        fs::write(&target, page).map_err(|err| Error::WritePage { path: target, err })?;
        Ok(output_name)
    }

    /// Front-matter fields first, metadata-index fields over them, and the
    /// derived fields last so nothing clobbers the resolved title.
    fn template_data(
        &self,
        front_matter: &FrontMatter,
        body: &str,
        file_name: &str,
        record: Option<&PostRecord>,
        toc_html: String,
        html: String,
    ) -> Value {
        let mut data: HashMap<String, Value> = HashMap::new();
        insert_front_matter(&mut data, front_matter);
        if let Some(record) = record {
            insert_record(&mut data, record);
        }

        let flags = &self.config.template_config;
        let show_toc = flags.flag("showToc") && !toc_html.is_empty();
        let word_count = record
            .map(|record| record.word_count)
            .unwrap_or_else(|| article::word_count(body));

        data.insert(
            "title".to_owned(),
            Value::String(resolve_title(front_matter, body, file_name, record)),
        );
        data.insert("content".to_owned(), Value::String(html));
        data.insert("toc".to_owned(), Value::String(toc_html));
        data.insert(
            "timestamp".to_owned(),
            Value::String(Local::now().format("%Y/%m/%d %H:%M:%S").to_string()),
        );
        data.insert("showToc".to_owned(), Value::from(show_toc));
        data.insert("highlightjs".to_owned(), Value::from(flags.flag("highlightjs")));
        data.insert(
            "builtResources".to_owned(),
            serde_json::to_value(&self.assets)
                .map(|json| value::to_value(&json))
                .unwrap_or(Value::Nil),
        );
        data.insert(
            "meta".to_owned(),
            value::object([
                (
                    "fileName".to_owned(),
                    Value::String(file_name.to_owned()),
                ),
                (
                    "generatedAt".to_owned(),
                    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                ),
                ("wordCount".to_owned(), Value::from(word_count as i64)),
            ]),
        );
        Value::Object(data)
    }

    fn scan(&self) -> Vec<String> {
        let doc_dir = &self.config.paths.doc_dir;
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
}

/// Metadata-index title, else front-matter title, else the first level-1
/// heading, else a filename-derived title.
fn resolve_title(
    front_matter: &FrontMatter,
    body: &str,
    file_name: &str,
    record: Option<&PostRecord>,
) -> String {
    if let Some(record) = record {
        if !record.title.is_empty() {
            return record.title.clone();
        }
    }
    if let Some(title) = &front_matter.title {
        return title.clone();
    }
    if let Some(heading) = article::first_heading(body) {
        return heading;
    }
    article::title_from_filename(file_name)
}

fn insert_front_matter(data: &mut HashMap<String, Value>, front_matter: &FrontMatter) {
    for (key, field) in [
        ("title", &front_matter.title),
        ("date", &front_matter.date),
        ("lastmod", &front_matter.lastmod),
        ("excerpt", &front_matter.excerpt),
        ("description", &front_matter.description),
        ("cover", &front_matter.cover),
    ] {
        if let Some(text) = field {
            data.insert(key.to_owned(), Value::String(text.clone()));
        }
    }
    data.insert("tags".to_owned(), value::string_list(&front_matter.tags));
    data.insert(
        "categories".to_owned(),
        value::string_list(&front_matter.categories),
    );
    data.insert("draft".to_owned(), Value::from(front_matter.draft));
    for (key, json) in &front_matter.extra {
        data.insert(key.clone(), value::to_value(json));
    }
}

fn insert_record(data: &mut HashMap<String, Value>, record: &PostRecord) {
    for (key, text) in [
        ("slug", &record.slug),
        ("date", &record.date),
        ("lastmod", &record.lastmod),
        ("excerpt", &record.excerpt),
        ("description", &record.description),
        ("cover", &record.cover),
        ("readTime", &record.read_time),
    ] {
        data.insert(key.to_owned(), Value::String(text.clone()));
    }
    data.insert("tags".to_owned(), value::string_list(&record.tags));
    data.insert(
        "categories".to_owned(),
        value::string_list(&record.categories),
    );
    data.insert("wordCount".to_owned(), Value::from(record.word_count as i64));
    data.insert("draft".to_owned(), Value::from(record.draft));
}

fn output_file_name(file_name: &str, output_extension: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    format!("{}{}", stem, output_extension)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a page-generation error. `CreateDir` fails the stage; the
/// per-file variants are caught, logged, and counted by [`PostGenerator::generate`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("loading templates: {0}")]
    Templates(#[from] template::Error),

    #[error("creating post directory `{path}`: {err}")]
    CreateDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("reading `{path}`: {err}")]
    ReadSource {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("parsing front matter in `{file}`: {err}")]
    FrontMatter {
        file: String,
        #[source]
        err: frontmatter::Error,
    },

    #[error("rendering `{file}`: {err}")]
    Render {
        file: String,
        #[source]
        err: template::Error,
    },

    #[error("writing page `{path}`: {err}")]
    WritePage {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
