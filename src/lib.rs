//! The library code for the `mdpress` static blog pipeline. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Deriving the consolidated metadata index from the Markdown sources
//!    ([`crate::metadata`])
//! 2. Rendering one HTML page per source through the template engine
//!    ([`crate::posts`])
//!
//! Both steps read the same sources: documents with an optional YAML
//! front-matter preamble ([`crate::frontmatter`]) whose derived fields
//! (slug, title, excerpt, read time) live in [`crate::article`]. The page
//! step additionally builds a table of contents ([`crate::toc`]), converts
//! the body ([`crate::markdown`]), and resolves bundled asset paths
//! ([`crate::assets`]). [`crate::build`] chains the steps into a full build,
//! finishing with a static-asset sync.
//!
//! Everything is driven by a `config.yaml` at the project root
//! ([`crate::config`]), with all configured paths resolved against the
//! project directory ([`crate::paths`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod assets;
pub mod build;
pub mod config;
pub mod frontmatter;
pub mod logger;
pub mod markdown;
pub mod metadata;
pub mod paths;
pub mod posts;
pub mod template;
pub mod toc;
pub mod value;
