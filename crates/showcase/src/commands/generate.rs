//! Image generation command.

use std::path::Path;

use anyhow::Result;
use showcase_assets::AssetGenerator;

use crate::config::load_config;

/// Run the generate command.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?.generate_config();

    tracing::info!("Generating images for {}", config.descriptor_path.display());

    let result = AssetGenerator::new(config).run().await?;

    tracing::info!(
        "{} placeholders: {} rendered, {} already present ({}ms)",
        result.placeholders,
        result.rendered,
        result.skipped,
        result.duration_ms
    );

    tracing::info!("Updated descriptor: {}", result.updated_path.display());

    Ok(())
}
