//! Project configuration. The primary format is `config.yaml`; when it
//! cannot be read or parsed the loader falls back to a cached `config.json`
//! copy, and a successful YAML load regenerates that copy (best-effort).
//! Neither form being usable is fatal: the pipeline cannot run without
//! configuration. All configured paths are resolved to absolute form at load
//! time via [`PathResolver`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::PathResolver;
use crate::warn;

const CONFIG_YAML: &str = "config.yaml";
const CONFIG_JSON: &str = "config.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub markdown_config: MarkdownConfig,
    #[serde(default)]
    pub template_config: TemplateConfig,
    #[serde(default)]
    pub file_config: FileConfig,
}

/// Site identity fields. Unknown keys are preserved so templates can use
/// them through the `site` global.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,
    pub default_cover: String,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Named file-system locations. `docDir`, `postDir`, `templateDir`, and
/// `metadataFile` are required; the rest are optional features.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    /// Directory of Markdown source documents.
    pub doc_dir: PathBuf,

    /// Directory receiving the generated HTML pages.
    pub post_dir: PathBuf,

    /// Directory of template files.
    pub template_dir: PathBuf,

    /// Output path for the consolidated metadata index.
    pub metadata_file: PathBuf,

    /// Build-tool asset manifest, if the site uses bundled assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_file: Option<PathBuf>,

    /// Static assets synced into `outputDir` during a full build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkdownConfig {
    pub options: MarkdownOptions,
}

/// Markdown renderer toggles. Everything defaults to on.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,

    /// Inject `id` attributes on rendered headings so TOC links resolve.
    pub heading_anchors: bool,
}

impl Default for MarkdownOptions {
    fn default() -> MarkdownOptions {
        MarkdownOptions {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: true,
            heading_anchors: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Template used for post pages when no other name is given.
    pub default_template: String,

    /// Free-form values exposed to every template render (e.g. `showToc`,
    /// `highlightjs`).
    pub template_data: HashMap<String, serde_json::Value>,
}

impl Default for TemplateConfig {
    fn default() -> TemplateConfig {
        TemplateConfig {
            default_template: "post.html".to_owned(),
            template_data: HashMap::new(),
        }
    }
}

impl TemplateConfig {
    /// Reads a boolean flag from `templateData`, defaulting to true when the
    /// key is absent.
    pub fn flag(&self, key: &str) -> bool {
        match self.template_data.get(key) {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(_) | None => true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    /// Source extensions (with leading dot) accepted by the scanners.
    pub supported_extensions: Vec<String>,

    /// Extension (with leading dot) of the generated pages.
    pub output_extension: String,
}

impl Default for FileConfig {
    fn default() -> FileConfig {
        FileConfig {
            supported_extensions: vec![".md".to_owned(), ".markdown".to_owned()],
            output_extension: ".html".to_owned(),
        }
    }
}

impl FileConfig {
    /// Whether `file_name` carries one of the supported source extensions.
    pub fn is_supported(&self, file_name: &str) -> bool {
        let ext = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
            None => return false,
            Some(ext) => format!(".{}", ext.to_lowercase()),
        };
        self.supported_extensions
            .iter()
            .any(|supported| supported.to_lowercase() == ext)
    }
}

impl Config {
    /// Searches `start` and its parent directories for `config.yaml` or
    /// `config.json` and loads from the first directory containing either.
    pub fn discover(start: &Path) -> Result<Config> {
        let start = start.canonicalize().map_err(|err| Error::Read {
            path: start.to_owned(),
            err,
        })?;
        let mut dir: &Path = &start;
        loop {
            if dir.join(CONFIG_YAML).is_file() || dir.join(CONFIG_JSON).is_file() {
                return Config::from_project_dir(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => {
                    return Err(Error::NotFound {
                        start: start.clone(),
                    })
                }
            }
        }
    }

    /// Loads configuration from `dir`, trying `config.yaml` first and
    /// falling back to `config.json`.
    pub fn from_project_dir(dir: &Path) -> Result<Config> {
        let resolver = PathResolver::new(dir);
        let yaml_path = dir.join(CONFIG_YAML);
        let json_path = dir.join(CONFIG_JSON);

        match fs::read_to_string(&yaml_path) {
            Err(err) => {
                warn!(
                    "reading `{}`: {}; falling back to JSON configuration",
                    yaml_path.display(),
                    err
                );
            }
            Ok(text) => match serde_yaml::from_str::<Config>(&text) {
                Err(err) => {
                    warn!(
                        "parsing `{}`: {}; falling back to JSON configuration",
                        yaml_path.display(),
                        err
                    );
                }
                Ok(mut config) => {
                    config.resolve_paths(&resolver);
                    config.write_json_copy(&json_path);
                    return Ok(config);
                }
            },
        }

        let text = fs::read_to_string(&json_path).map_err(|err| Error::Read {
            path: json_path.clone(),
            err,
        })?;
        let mut config: Config = serde_json::from_str(&text).map_err(|err| Error::Json {
            path: json_path,
            err,
        })?;
        config.resolve_paths(&resolver);
        Ok(config)
    }

    fn resolve_paths(&mut self, resolver: &PathResolver) {
        let paths = &mut self.paths;
        paths.doc_dir = resolver.resolve(&paths.doc_dir);
        paths.post_dir = resolver.resolve(&paths.post_dir);
        paths.template_dir = resolver.resolve(&paths.template_dir);
        paths.metadata_file = resolver.resolve(&paths.metadata_file);
        for optional in [
            &mut paths.manifest_file,
            &mut paths.static_dir,
            &mut paths.output_dir,
        ] {
            if let Some(path) = optional {
                *path = resolver.resolve(path);
            }
        }
    }

    /// Regenerates the JSON fallback copy. Failure is logged but never fails
    /// the load.
    fn write_json_copy(&self, json_path: &Path) {
        let result = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(json_path, json));
        if let Err(err) = result {
            warn!(
                "writing JSON configuration copy `{}`: {}",
                json_path.display(),
                err
            );
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a configuration-loading failure. All variants are fatal: the
/// pipeline cannot run without configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no `config.yaml` or `config.json` found in `{start}` or any parent directory")]
    NotFound { start: PathBuf },

    #[error("reading configuration `{path}`: {err}")]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("parsing JSON configuration `{path}`: {err}")]
    Json {
        path: PathBuf,
        #[source]
        err: serde_json::Error,
    },
}
