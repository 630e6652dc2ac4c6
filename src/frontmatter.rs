//! Splits a source document into its YAML front matter and Markdown body.
//!
//! A document may omit front matter entirely, in which case the whole input
//! is the body. An opening fence without a closing fence and unparseable
//! YAML are explicit errors; callers decide whether to skip the file or
//! abort.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

const FENCE: &str = "---";

/// The typed front-matter preamble. Unknown keys are kept in `extra` so they
/// can still be handed to templates.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub lastmod: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub excerpt: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub draft: bool,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The result of splitting a source document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Parses `input` into a [`Document`].
pub fn parse(input: &str) -> Result<Document> {
    let rest = match input.strip_prefix(FENCE) {
        None => return Ok(body_only(input)),
        Some(rest) => rest,
    };

    // The opening fence must be a full line; anything else (e.g. a document
    // starting with a thematic break like `----`) is body text.
    let rest = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
        None => return Ok(body_only(input)),
        Some(rest) => rest,
    };

    // The closing fence may follow immediately, giving an empty block.
    let (yaml, after) = match rest.strip_prefix(FENCE) {
        Some(after) => ("", after),
        None => match rest.find("\n---") {
            None => return Err(Error::MissingEndFence),
            Some(offset) => (&rest[..offset], &rest[offset + 1 + FENCE.len()..]),
        },
    };
    let body = match after.find('\n') {
        Some(i) => &after[i + 1..],
        None => "",
    };

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(Document {
        front_matter,
        body: body.to_owned(),
    })
}

fn body_only(input: &str) -> Document {
    Document {
        front_matter: FrontMatter::default(),
        body: input.to_owned(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or parsing front matter.
#[derive(Debug, Error)]
pub enum Error {
    /// The opening `---` fence was found but the closing one was not.
    #[error("missing closing `---` fence")]
    MissingEndFence,

    /// The front-matter block is not valid YAML.
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let doc = parse(
            "---\ntitle: Hello\ndate: 2024-01-01\ntags:\n  - rust\n  - blog\ndraft: true\n---\n# Heading\n\nBody text.\n",
        )
        .unwrap();
        assert_eq!(doc.front_matter.title.as_deref(), Some("Hello"));
        assert_eq!(doc.front_matter.date.as_deref(), Some("2024-01-01"));
        assert_eq!(doc.front_matter.tags, vec!["rust", "blog"]);
        assert!(doc.front_matter.draft);
        assert_eq!(doc.body, "# Heading\n\nBody text.\n");
    }

    #[test]
    fn test_unknown_keys_land_in_extra() {
        let doc = parse("---\ntitle: x\nauthor: someone\n---\nbody").unwrap();
        assert_eq!(
            doc.front_matter.extra.get("author"),
            Some(&serde_json::Value::String("someone".to_owned()))
        );
    }

    #[test]
    fn test_document_without_front_matter() {
        let doc = parse("# Just a heading\n\nNo preamble.\n").unwrap();
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "# Just a heading\n\nNo preamble.\n");
    }

    #[test]
    fn test_empty_front_matter_block() {
        let doc = parse("---\n---\nbody\n").unwrap();
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "body\n");

        // Immediately closed block with no body at all.
        let doc = parse("---\n---").unwrap();
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_missing_end_fence_is_an_error() {
        match parse("---\ntitle: broken\n") {
            Err(Error::MissingEndFence) => {}
            other => panic!("expected MissingEndFence, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let result = parse("---\ntitle: [unclosed\n---\nbody\n");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }
}
