//! Wraps the gtmpl template engine. Templates are loaded from the configured
//! template directory (created if missing) at construction time; every
//! render context carries the global values (site configuration, the build
//! timestamp, the current year, and `templateConfig.templateData`) plus the
//! caller's data, with the caller's data winning on key collisions.
//!
//! The engine is extended with the functions `formatDate`, `join`,
//! `slugify`, and `round`, callable from templates as e.g.
//! `{{formatDate .date}}` or `{{join .tags ", "}}`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use gtmpl::{Context, Template, Value};
use thiserror::Error;

use crate::config::Config;
use crate::value;

pub struct TemplateManager {
    templates: HashMap<String, Template>,
    globals: HashMap<String, Value>,
    default_template: String,
}

impl TemplateManager {
    /// Loads every `.html`/`.htm` file in the configured template directory,
    /// creating the directory first if it does not exist.
    pub fn new(config: &Config) -> Result<TemplateManager> {
        let dir = &config.paths.template_dir;
        fs::create_dir_all(dir).map_err(|err| Error::TemplateDir {
            path: dir.clone(),
            err,
        })?;

        let mut templates = HashMap::new();
        let entries = fs::read_dir(dir).map_err(|err| Error::TemplateDir {
            path: dir.clone(),
            err,
        })?;
        for entry in entries {
            let entry = entry.map_err(|err| Error::TemplateDir {
                path: dir.clone(),
                err,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !(name.ends_with(".html") || name.ends_with(".htm")) {
                continue;
            }
            let text = fs::read_to_string(entry.path()).map_err(|err| Error::ReadTemplate {
                path: entry.path(),
                err,
            })?;
            let mut template = Template::default();
            register_funcs(&mut template);
            template.parse(&text).map_err(|err| Error::Parse {
                name: name.clone(),
                err,
            })?;
            templates.insert(name, template);
        }

        Ok(TemplateManager {
            templates,
            globals: globals(config),
            default_template: config.template_config.default_template.clone(),
        })
    }

    /// The names of all loaded templates.
    pub fn available(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Renders the named template (the configured default when `name` is
    /// empty) with `data` merged over the globals.
    pub fn render(&self, name: &str, data: Value) -> Result<String> {
        let name = if name.is_empty() {
            &self.default_template
        } else {
            name
        };
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_owned(),
            })?;

        let mut root = self.globals.clone();
        if let Value::Object(data) = data {
            root.extend(data);
        }

        let mut output: Vec<u8> = Vec::new();
        template
            .execute(
                &mut output,
                &Context::from(Value::Object(root)).map_err(|err| Error::Render {
                    name: name.to_owned(),
                    err,
                })?,
            )
            .map_err(|err| Error::Render {
                name: name.to_owned(),
                err,
            })?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

fn globals(config: &Config) -> HashMap<String, Value> {
    let mut globals = HashMap::new();
    let site = serde_json::to_value(&config.site)
        .map(|json| value::to_value(&json))
        .unwrap_or(Value::Nil);
    globals.insert("site".to_owned(), site);
    globals.insert(
        "timestamp".to_owned(),
        Value::String(Local::now().format("%Y/%m/%d %H:%M:%S").to_string()),
    );
    globals.insert("year".to_owned(), Value::from(i64::from(Local::now().year())));
    for (key, json) in &config.template_config.template_data {
        globals.insert(key.clone(), value::to_value(json));
    }
    globals
}

fn register_funcs(template: &mut Template) {
    template.add_func("formatDate", format_date);
    template.add_func("join", join);
    template.add_func("slugify", slugify);
    template.add_func("round", round);
}

/// `{{formatDate .date}}` or `{{formatDate .date "%Y-%m-%d"}}`. Dates that
/// cannot be parsed pass through unchanged.
fn format_date(args: &[Value]) -> std::result::Result<Value, String> {
    let date = match args.first() {
        Some(Value::String(s)) => s,
        Some(other) => return Ok(other.clone()),
        None => return Err("formatDate requires a date".to_owned()),
    };
    let pattern = match args.get(1) {
        Some(Value::String(p)) => p.as_str(),
        _ => "%Y年%m月%d日",
    };
    // Accept both plain dates and ISO datetimes by taking the date part.
    let day = date.get(..10).unwrap_or(date);
    Ok(match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(parsed) => Value::String(parsed.format(pattern).to_string()),
        Err(_) => Value::String(date.clone()),
    })
}

/// `{{join .tags ", "}}`; the separator defaults to `", "`. Non-array
/// arguments pass through unchanged.
fn join(args: &[Value]) -> std::result::Result<Value, String> {
    let items = match args.first() {
        Some(Value::Array(items)) => items,
        Some(other) => return Ok(other.clone()),
        None => return Err("join requires an array".to_owned()),
    };
    let separator = match args.get(1) {
        Some(Value::String(s)) => s.as_str(),
        _ => ", ",
    };
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Ok(Value::String(parts.join(separator)))
}

/// `{{slugify .title}}` converts a string to a URL-friendly slug.
fn slugify(args: &[Value]) -> std::result::Result<Value, String> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::String(slug::slugify(s))),
        Some(other) => Ok(other.clone()),
        None => Err("slugify requires a string".to_owned()),
    }
}

/// `{{round .value}}` rounds a number to the nearest integer.
fn round(args: &[Value]) -> std::result::Result<Value, String> {
    match args.first() {
        Some(Value::Number(n)) => {
            let rounded = n.as_f64().unwrap_or(0.0).round() as i64;
            Ok(Value::from(rounded))
        }
        Some(other) => Ok(other.clone()),
        None => Err("round requires a number".to_owned()),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a template-loading or rendering error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("creating template directory `{path}`: {err}")]
    TemplateDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("reading template `{path}`: {err}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("parsing template `{name}`: {err}")]
    Parse { name: String, err: String },

    #[error("template `{name}` not found in template directory")]
    NotFound { name: String },

    #[error("rendering template `{name}`: {err}")]
    Render { name: String, err: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{PathsConfig, SiteConfig};
    use std::path::Path;

    fn test_config(dir: &Path) -> Config {
        Config {
            site: SiteConfig {
                title: "Test Site".to_owned(),
                ..SiteConfig::default()
            },
            paths: PathsConfig {
                doc_dir: dir.join("docs"),
                post_dir: dir.join("posts"),
                template_dir: dir.join("templates"),
                metadata_file: dir.join("metadata.json"),
                manifest_file: None,
                static_dir: None,
                output_dir: None,
            },
            markdown_config: Default::default(),
            template_config: Default::default(),
            file_config: Default::default(),
        }
    }

    #[test]
    fn test_render_merges_globals_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.paths.template_dir).unwrap();
        fs::write(
            config.paths.template_dir.join("post.html"),
            "<h1>{{.title}}</h1><p>{{.site.title}}</p>",
        )
        .unwrap();

        let manager = TemplateManager::new(&config).unwrap();
        let html = manager
            .render(
                "post.html",
                value::object([(
                    "title".to_owned(),
                    Value::String("Hello".to_owned()),
                )]),
            )
            .unwrap();
        assert_eq!(html, "<h1>Hello</h1><p>Test Site</p>");
    }

    #[test]
    fn test_render_applies_custom_funcs() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.paths.template_dir).unwrap();
        fs::write(
            config.paths.template_dir.join("post.html"),
            "{{slugify .title}}",
        )
        .unwrap();

        let manager = TemplateManager::new(&config).unwrap();
        let html = manager
            .render(
                "post.html",
                value::object([(
                    "title".to_owned(),
                    Value::String("Hello World".to_owned()),
                )]),
            )
            .unwrap();
        assert_eq!(html, "hello-world");
    }

    #[test]
    fn test_unknown_template_errors_with_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        // The template directory is created on demand and starts empty.
        let manager = TemplateManager::new(&config).unwrap();
        match manager.render("missing.html", Value::Object(HashMap::new())) {
            Err(Error::NotFound { name }) => assert_eq!(name, "missing.html"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_format_date_func() {
        let formatted = format_date(&[Value::String("2024-01-15".to_owned())]).unwrap();
        assert_eq!(formatted, Value::String("2024年01月15日".to_owned()));

        let passthrough = format_date(&[Value::String("not a date".to_owned())]).unwrap();
        assert_eq!(passthrough, Value::String("not a date".to_owned()));
    }

    #[test]
    fn test_join_func() {
        let joined = join(&[
            Value::Array(vec![
                Value::String("a".to_owned()),
                Value::String("b".to_owned()),
            ]),
            Value::String(" / ".to_owned()),
        ])
        .unwrap();
        assert_eq!(joined, Value::String("a / b".to_owned()));
    }

    #[test]
    fn test_round_func() {
        assert_eq!(round(&[Value::from(3.6)]).unwrap(), Value::from(4i64));
        assert_eq!(round(&[Value::from(3.4)]).unwrap(), Value::from(3i64));
    }

    // The engine expects funcs to fail with plain message strings.
    #[test]
    fn test_funcs_fail_with_message_strings() {
        assert_eq!(slugify(&[]), Err("slugify requires a string".to_owned()));
        assert_eq!(join(&[]), Err("join requires an array".to_owned()));
        assert_eq!(format_date(&[]), Err("formatDate requires a date".to_owned()));
        assert_eq!(round(&[]), Err("round requires a number".to_owned()));
    }
}
