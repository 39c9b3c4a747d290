//! Configuration file (showcase.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use showcase_assets::{
    DevicePreference, DiffusionConfig, GenerateConfig, PromptConfig, Resolution, SynthConfig,
};
use showcase_static::{Labels, SiteConfig};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    descriptor: DescriptorSettings,
    #[serde(default)]
    ollama: OllamaSettings,
    #[serde(default)]
    style: StyleSettings,
    #[serde(default)]
    diffusion: DiffusionSettings,
    #[serde(default)]
    site: SiteSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DescriptorSettings {
    input: PathBuf,
    output: PathBuf,
}

impl Default for DescriptorSettings {
    fn default() -> Self {
        let defaults = GenerateConfig::default();
        Self {
            input: defaults.descriptor_path,
            output: defaults.updated_path,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OllamaSettings {
    base_url: String,
    model: String,
    timeout_secs: u64,
    temperature: f64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        let defaults = PromptConfig::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            timeout_secs: defaults.timeout_secs,
            temperature: defaults.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StyleSettings {
    look: String,
    avoid: String,
}

impl Default for StyleSettings {
    fn default() -> Self {
        let defaults = PromptConfig::default();
        Self {
            look: defaults.style_look,
            avoid: defaults.style_avoid,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DiffusionSettings {
    model: PathBuf,
    device: DevicePreference,
    accelerated_binary: String,
    cpu_binary: String,
    memory_flags: Vec<String>,
    output_dir: PathBuf,
    seed_base: u64,
    steps: u32,
    guidance: f64,
    /// Merged over the built-in table
    resolutions: BTreeMap<String, Resolution>,
}

impl Default for DiffusionSettings {
    fn default() -> Self {
        let runtime = DiffusionConfig::default();
        let synth = SynthConfig::default();
        Self {
            model: runtime.model,
            device: runtime.device,
            accelerated_binary: runtime.accelerated_binary,
            cpu_binary: runtime.cpu_binary,
            memory_flags: runtime.memory_flags,
            output_dir: synth.output_dir,
            seed_base: synth.seed_base,
            steps: synth.steps,
            guidance: synth.guidance,
            resolutions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SiteSettings {
    output: PathBuf,
    minify: bool,
    lang: String,
    labels: Labels,
}

impl Default for SiteSettings {
    fn default() -> Self {
        let defaults = SiteConfig::default();
        Self {
            output: defaults.output_dir,
            minify: defaults.minify,
            lang: defaults.lang,
            labels: defaults.labels,
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    tracing::debug!("No config at {}, using defaults", path.display());
    Ok(ConfigFile::default())
}

impl ConfigFile {
    /// Settings for the generate stage.
    pub fn generate_config(&self) -> GenerateConfig {
        let mut synth = SynthConfig {
            output_dir: self.diffusion.output_dir.clone(),
            seed_base: self.diffusion.seed_base,
            steps: self.diffusion.steps,
            guidance: self.diffusion.guidance,
            ..SynthConfig::default()
        };
        synth.resolutions.extend(
            self.diffusion
                .resolutions
                .iter()
                .map(|(section, res)| (section.clone(), *res)),
        );

        GenerateConfig {
            descriptor_path: self.descriptor.input.clone(),
            updated_path: self.descriptor.output.clone(),
            prompts: PromptConfig {
                base_url: self.ollama.base_url.clone(),
                model: self.ollama.model.clone(),
                timeout_secs: self.ollama.timeout_secs,
                temperature: self.ollama.temperature,
                style_look: self.style.look.clone(),
                style_avoid: self.style.avoid.clone(),
            },
            synth,
            diffusion: DiffusionConfig {
                model: self.diffusion.model.clone(),
                accelerated_binary: self.diffusion.accelerated_binary.clone(),
                cpu_binary: self.diffusion.cpu_binary.clone(),
                device: self.diffusion.device,
                memory_flags: self.diffusion.memory_flags.clone(),
            },
        }
    }

    /// Settings for the build stage. Images are read from where generate wrote them.
    pub fn site_config(&self) -> SiteConfig {
        SiteConfig {
            descriptor_path: self.descriptor.output.clone(),
            images_dir: self.diffusion.output_dir.clone(),
            output_dir: self.site.output.clone(),
            minify: self.site.minify,
            lang: self.site.lang.clone(),
            labels: self.site.labels.clone(),
        }
    }
}
