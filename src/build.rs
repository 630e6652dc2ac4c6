//! Full-build orchestration: metadata index, then HTML pages, then static
//! assets. Each stage's error type is wrapped so callers can tell which
//! stage failed.

use thiserror::Error;

use crate::assets;
use crate::config::Config;
use crate::info;
use crate::metadata::{self, MetadataGenerator};
use crate::posts::{self, PostGenerator, Summary};

/// Runs the whole pipeline. The static-asset sync only runs when both
/// `staticDir` and `outputDir` are configured.
pub fn build_site(config: &Config) -> Result<Summary> {
    let index = MetadataGenerator::new(config).generate()?;
    info!("metadata ready ({} posts)", index.post_count);

    let summary = PostGenerator::new(config)?.generate()?;

    if let (Some(static_dir), Some(output_dir)) =
        (&config.paths.static_dir, &config.paths.output_dir)
    {
        assets::sync_static(static_dir, output_dir)?;
    }
    Ok(summary)
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("metadata stage: {0}")]
    Metadata(#[from] metadata::Error),

    #[error("post stage: {0}")]
    Posts(#[from] posts::Error),

    #[error("static asset sync: {0}")]
    Assets(#[from] assets::Error),
}
