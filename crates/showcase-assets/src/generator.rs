//! The asset generation stage: descriptor in, images and updated descriptor out.

use std::path::PathBuf;
use std::time::Instant;

use showcase_descriptor::{Descriptor, DescriptorError};

use crate::diffusion::{DiffusionCli, DiffusionConfig};
use crate::ollama::{OllamaClient, PromptConfig, TextGenerator};
use crate::prompts::{request_prompts, GenerationContext, PromptError, PromptRecord, StyleDirective};
use crate::synth::{synthesize, ImageBackend, SynthConfig, SynthError};

/// Configuration for the asset generation stage.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Source descriptor
    pub descriptor_path: PathBuf,

    /// Where the updated descriptor is written
    pub updated_path: PathBuf,

    /// Prompt model settings
    pub prompts: PromptConfig,

    /// Rendering settings
    pub synth: SynthConfig,

    /// Diffusion runtime settings
    pub diffusion: DiffusionConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            descriptor_path: PathBuf::from("producto.xml"),
            updated_path: PathBuf::from("producto.updated.xml"),
            prompts: PromptConfig::default(),
            synth: SynthConfig::default(),
            diffusion: DiffusionConfig::default(),
        }
    }
}

/// Result of a generation run.
#[derive(Debug)]
pub struct GenerateResult {
    /// Number of placeholders found
    pub placeholders: usize,

    /// Images rendered in this run
    pub rendered: usize,

    /// Images reused from a previous run
    pub skipped: usize,

    /// Total run time in milliseconds
    pub duration_ms: u64,

    /// Updated descriptor path
    pub updated_path: PathBuf,
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Runs prompt generation, image synthesis and descriptor writing in sequence.
pub struct AssetGenerator {
    config: GenerateConfig,
}

impl AssetGenerator {
    /// Create a new generator.
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Run against the configured Ollama server and diffusion runtime.
    pub async fn run(&self) -> Result<GenerateResult, GenerateError> {
        let start = Instant::now();
        let client = OllamaClient::new(&self.config.prompts)?;

        let mut descriptor = Descriptor::load(&self.config.descriptor_path)?;
        let prompts = self.ask_prompts(&client, &descriptor).await?;

        if prompts.is_empty() {
            descriptor.write(&self.config.updated_path)?;
            return Ok(GenerateResult {
                placeholders: 0,
                rendered: 0,
                skipped: 0,
                duration_ms: start.elapsed().as_millis() as u64,
                updated_path: self.config.updated_path.clone(),
            });
        }

        tracing::info!("Loading diffusion runtime...");
        let mut backend = DiffusionCli::load(&self.config.diffusion).await?;

        self.render_and_write(&mut backend, &mut descriptor, &prompts, start)
            .await
    }

    /// Run with caller-provided text and image backends.
    pub async fn run_with<G, B>(
        &self,
        generator: &G,
        backend: &mut B,
    ) -> Result<GenerateResult, GenerateError>
    where
        G: TextGenerator + ?Sized,
        B: ImageBackend + ?Sized,
    {
        let start = Instant::now();

        let mut descriptor = Descriptor::load(&self.config.descriptor_path)?;
        let prompts = self.ask_prompts(generator, &descriptor).await?;

        self.render_and_write(backend, &mut descriptor, &prompts, start)
            .await
    }

    async fn ask_prompts<G: TextGenerator + ?Sized>(
        &self,
        generator: &G,
        descriptor: &Descriptor,
    ) -> Result<Vec<PromptRecord>, GenerateError> {
        let style = StyleDirective {
            look: self.config.prompts.style_look.clone(),
            avoid: self.config.prompts.style_avoid.clone(),
        };
        let context = GenerationContext::from_descriptor(descriptor, style);
        let placeholders = descriptor.placeholders();

        tracing::info!("Found {} image placeholders", placeholders.len());
        tracing::info!("Requesting prompts from {}...", self.config.prompts.model);

        Ok(request_prompts(
            generator,
            &context,
            &placeholders,
            self.config.prompts.temperature,
        )
        .await?)
    }

    async fn render_and_write<B: ImageBackend + ?Sized>(
        &self,
        backend: &mut B,
        descriptor: &mut Descriptor,
        prompts: &[PromptRecord],
        start: Instant,
    ) -> Result<GenerateResult, GenerateError> {
        let placeholders = descriptor.placeholders();
        let report = synthesize(backend, descriptor, &placeholders, prompts, &self.config.synth).await?;

        descriptor.write(&self.config.updated_path)?;

        Ok(GenerateResult {
            placeholders: placeholders.len(),
            rendered: report.rendered,
            skipped: report.skipped,
            duration_ms: start.elapsed().as_millis() as u64,
            updated_path: self.config.updated_path.clone(),
        })
    }
}
