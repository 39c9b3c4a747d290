//! Asset generation for showcase descriptors.
//!
//! Asks a local text model for one image prompt per descriptor placeholder,
//! renders each prompt with a local diffusion runtime, and rewrites the
//! placeholders' `src` attributes to the generated files.

pub mod diffusion;
pub mod generator;
pub mod ollama;
pub mod prompts;
pub mod synth;

pub use diffusion::{Device, DevicePreference, DiffusionCli, DiffusionConfig};
pub use generator::{AssetGenerator, GenerateConfig, GenerateError, GenerateResult};
pub use ollama::{GenerateRequest, OllamaClient, PromptConfig, TextGenerator};
pub use prompts::{
    extract_json_object, parse_prompt_response, request_prompts, GenerationContext, PromptBook,
    PromptError, PromptRecord, PromptResponse, StyleDirective,
};
pub use synth::{synthesize, ImageBackend, RenderJob, Resolution, SynthConfig, SynthError, SynthReport};
