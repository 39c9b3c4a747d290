//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use showcase_static::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let mut config = load_config(config_path)?.site_config();
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let result = SiteBuilder::new(config).build().await?;

    tracing::info!(
        "Built page with {} sections and {} images in {}ms",
        result.sections,
        result.images,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.join("index.html").display());

    Ok(())
}
