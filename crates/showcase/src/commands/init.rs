//! Write a default configuration file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'showcase generate' and then 'showcase build'.");

    Ok(())
}

pub(crate) const DEFAULT_CONFIG: &str = r#"# Showcase configuration

[descriptor]
# Product descriptor to read
input = "producto.xml"

# Descriptor written with generated image paths
output = "producto.updated.xml"

[ollama]
base_url = "http://127.0.0.1:11434"
model = "llama3"
timeout_secs = 300
temperature = 0.2

[style]
look = "clean, warm, modern animal shelter landing, cinematic lighting, ultra detailed"
avoid = "text, letters, logos, watermark"

[diffusion]
model = "models/stable-diffusion-v1-5.safetensors"

# "auto" prefers the accelerated runtime when it is installed
device = "auto"
accelerated_binary = "sd-cuda"
cpu_binary = "sd"
memory_flags = ["--vae-tiling", "--diffusion-fa"]

output_dir = "generated_images"
seed_base = 12345
steps = 30
guidance = 7.5

[diffusion.resolutions]
hero = { width = 768, height = 432 }
problem = { width = 768, height = 432 }
solution = { width = 768, height = 432 }
features = { width = 640, height = 640 }
benefits = { width = 768, height = 432 }
cta = { width = 768, height = 432 }
misc = { width = 768, height = 432 }

[site]
output = "site"
minify = false
lang = "en"

[site.labels]
primary_action = "Adopt"
secondary_action = "Donate"
dark_mode = "Dark mode"
light_mode = "Light mode"
"#;
