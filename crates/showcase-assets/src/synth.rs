//! Image synthesis for descriptor placeholders.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use showcase_descriptor::{image_file_name, Descriptor, Placeholder, MISC_SECTION};

use crate::prompts::PromptRecord;

/// Output size of a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Size used when neither the section nor `misc` has an entry.
const LANDSCAPE: Resolution = Resolution::new(768, 432);

/// Configuration for rendering placeholders.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Directory generated images are written to
    pub output_dir: PathBuf,

    /// Seed of image `n` (1-based) is `seed_base + n`
    pub seed_base: u64,

    /// Denoising steps per image
    pub steps: u32,

    /// Classifier-free guidance scale
    pub guidance: f64,

    /// Resolution per section key, `misc` being the fallback
    pub resolutions: BTreeMap<String, Resolution>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        let resolutions = [
            ("hero", LANDSCAPE),
            ("problem", LANDSCAPE),
            ("solution", LANDSCAPE),
            ("features", Resolution::new(640, 640)),
            ("benefits", LANDSCAPE),
            ("cta", LANDSCAPE),
            (MISC_SECTION, LANDSCAPE),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            output_dir: PathBuf::from("generated_images"),
            seed_base: 12345,
            steps: 30,
            guidance: 7.5,
            resolutions,
        }
    }
}

impl SynthConfig {
    /// Resolution for a section key.
    pub fn resolution_for(&self, section: &str) -> Resolution {
        self.resolutions
            .get(section)
            .or_else(|| self.resolutions.get(MISC_SECTION))
            .copied()
            .unwrap_or(LANDSCAPE)
    }

    /// Path of the image for a placeholder, as written into `src`.
    pub fn image_path(&self, section: &str, alt: &str) -> PathBuf {
        self.output_dir.join(image_file_name(section, alt))
    }
}

/// Everything needed to render one image.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub prompt: &'a PromptRecord,
    pub resolution: Resolution,
    pub seed: u64,
    pub steps: u32,
    pub guidance: f64,
    pub output: &'a Path,
}

/// A diffusion runtime that can render a job to a PNG file.
#[async_trait]
pub trait ImageBackend: Send {
    /// Render `job` and write the image to `job.output`.
    async fn render(&mut self, job: &RenderJob<'_>) -> Result<(), SynthError>;
}

/// Counts from a synthesis pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthReport {
    /// Images rendered in this pass
    pub rendered: usize,
    /// Images that already existed
    pub skipped: usize,
}

/// Errors from image synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("Diffusion runtime not found: {0}")]
    RuntimeNotFound(String),

    #[error("Diffusion model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to start diffusion runtime: {0}")]
    Spawn(String),

    #[error("Failed to render {path}: {message}")]
    RenderFailed { path: String, message: String },

    #[error("Got {prompts} prompts for {placeholders} placeholders")]
    PromptCountMismatch { prompts: usize, placeholders: usize },

    #[error("Placeholder no longer present in descriptor: {0}")]
    PlaceholderMissing(String),

    #[error("Failed to prepare output directory: {0}")]
    Io(String),
}

/// Render every placeholder that has no image yet and point its `src` at the file.
///
/// Existing files are never re-rendered. `src` is rewritten for every
/// placeholder, rendered or not.
pub async fn synthesize<B: ImageBackend + ?Sized>(
    backend: &mut B,
    descriptor: &mut Descriptor,
    placeholders: &[Placeholder],
    prompts: &[PromptRecord],
    config: &SynthConfig,
) -> Result<SynthReport, SynthError> {
    if prompts.len() != placeholders.len() {
        return Err(SynthError::PromptCountMismatch {
            prompts: prompts.len(),
            placeholders: placeholders.len(),
        });
    }

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| SynthError::Io(format!("{}: {}", config.output_dir.display(), e)))?;

    let total = placeholders.len();
    let mut report = SynthReport::default();

    for (idx, (placeholder, prompt)) in placeholders.iter().zip(prompts).enumerate() {
        let number = idx + 1;
        let alt = if placeholder.alt.is_empty() {
            format!("image-{}", number)
        } else {
            placeholder.alt.clone()
        };
        let output = config.image_path(&placeholder.section, &alt);

        if output.exists() {
            tracing::debug!("[{}/{}] Keeping existing {}", number, total, output.display());
            report.skipped += 1;
        } else {
            let resolution = config.resolution_for(&placeholder.section);
            tracing::info!(
                "[{}/{}] Generating {} ({}x{})",
                number,
                total,
                output.display(),
                resolution.width,
                resolution.height
            );

            backend
                .render(&RenderJob {
                    prompt,
                    resolution,
                    seed: config.seed_base + number as u64,
                    steps: config.steps,
                    guidance: config.guidance,
                    output: &output,
                })
                .await?;
            report.rendered += 1;
        }

        let image = descriptor
            .element_mut(&placeholder.location)
            .ok_or_else(|| SynthError::PlaceholderMissing(alt.clone()))?;
        image.set_attr("src", output.to_string_lossy());
    }

    Ok(report)
}
