//! Stable Diffusion through a command-line runtime.
//!
//! Drives a stable-diffusion.cpp style binary (`sd`). Two builds can be
//! installed side by side: an accelerated one (CUDA, Vulkan, Metal...) and a
//! plain CPU one. The accelerated build is preferred when it is on `PATH`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::synth::{ImageBackend, RenderJob, SynthError};

/// Device the runtime executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Accelerated,
    Cpu,
}

/// Which device to try first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Accelerated when available, CPU otherwise
    #[default]
    Auto,
    /// Always CPU
    Cpu,
}

/// Configuration for the diffusion runtime.
#[derive(Debug, Clone)]
pub struct DiffusionConfig {
    /// Model weights passed with `-m`
    pub model: PathBuf,

    /// Accelerated runtime binary name or path
    pub accelerated_binary: String,

    /// CPU runtime binary name or path
    pub cpu_binary: String,

    /// Device preference
    pub device: DevicePreference,

    /// Memory-saving flags enabled on the accelerated device when supported
    pub memory_flags: Vec<String>,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("models/stable-diffusion-v1-5.safetensors"),
            accelerated_binary: "sd-cuda".to_string(),
            cpu_binary: "sd".to_string(),
            device: DevicePreference::Auto,
            memory_flags: vec!["--vae-tiling".to_string(), "--diffusion-fa".to_string()],
        }
    }
}

/// A loaded diffusion runtime.
#[derive(Debug)]
pub struct DiffusionCli {
    binary: PathBuf,
    device: Device,
    model: PathBuf,
    extra_args: Vec<String>,
}

impl DiffusionCli {
    /// Select a device, check the model, and probe optional flags.
    pub async fn load(config: &DiffusionConfig) -> Result<Self, SynthError> {
        Self::load_with_path(config, None).await
    }

    /// Like [`DiffusionCli::load`], searching `search_path` instead of `PATH`.
    pub async fn load_with_path(
        config: &DiffusionConfig,
        search_path: Option<OsString>,
    ) -> Result<Self, SynthError> {
        let (binary, device) = select_runtime(config, search_path.as_ref())?;

        if !config.model.exists() {
            return Err(SynthError::ModelNotFound(config.model.display().to_string()));
        }

        let extra_args = match device {
            Device::Accelerated => supported_flags(&binary, &config.memory_flags).await,
            Device::Cpu => Vec::new(),
        };

        tracing::info!(
            "Using {} on {:?} with model {}",
            binary.display(),
            device,
            config.model.display()
        );

        Ok(Self {
            binary,
            device,
            model: config.model.clone(),
            extra_args,
        })
    }

    /// Selected device.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Resolved runtime binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Optional flags that were enabled.
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    fn command(&self, job: &RenderJob<'_>, target: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-m")
            .arg(&self.model)
            .arg("-p")
            .arg(&job.prompt.prompt)
            .arg("-n")
            .arg(&job.prompt.negative_prompt)
            .arg("--steps")
            .arg(job.steps.to_string())
            .arg("--cfg-scale")
            .arg(job.guidance.to_string())
            .arg("-W")
            .arg(job.resolution.width.to_string())
            .arg("-H")
            .arg(job.resolution.height.to_string())
            .arg("-s")
            .arg(job.seed.to_string())
            .arg("-o")
            .arg(target)
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ImageBackend for DiffusionCli {
    async fn render(&mut self, job: &RenderJob<'_>) -> Result<(), SynthError> {
        // The final name only appears once the runtime succeeded.
        let partial = partial_path(job.output);
        let path = job.output.display().to_string();

        let output = self
            .command(job, &partial)
            .output()
            .await
            .map_err(|e| SynthError::Spawn(format!("{}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            discard(&partial);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthError::RenderFailed {
                path,
                message: format!("{} ({})", output.status, last_lines(&stderr, 5)),
            });
        }

        if !partial.exists() {
            return Err(SynthError::RenderFailed {
                path,
                message: "runtime exited successfully but wrote no image".to_string(),
            });
        }

        std::fs::rename(&partial, job.output).map_err(|e| {
            discard(&partial);
            SynthError::RenderFailed {
                path,
                message: format!("failed to move finished image into place: {}", e),
            }
        })
    }
}

/// Scratch file the runtime writes to: `<name>.part`.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn discard(partial: &Path) {
    if let Err(e) = std::fs::remove_file(partial) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove {}: {}", partial.display(), e);
        }
    }
}

fn select_runtime(
    config: &DiffusionConfig,
    search_path: Option<&OsString>,
) -> Result<(PathBuf, Device), SynthError> {
    if config.device == DevicePreference::Auto {
        match find_binary(&config.accelerated_binary, search_path) {
            Some(binary) => return Ok((binary, Device::Accelerated)),
            None => tracing::info!(
                "Accelerated runtime '{}' not found, falling back to CPU",
                config.accelerated_binary
            ),
        }
    }

    find_binary(&config.cpu_binary, search_path)
        .map(|binary| (binary, Device::Cpu))
        .ok_or_else(|| SynthError::RuntimeNotFound(config.cpu_binary.clone()))
}

fn find_binary(name: &str, search_path: Option<&OsString>) -> Option<PathBuf> {
    match search_path {
        Some(paths) => {
            let cwd = std::env::current_dir().ok()?;
            which::which_in(name, Some(paths), cwd).ok()
        }
        None => which::which(name).ok(),
    }
}

/// Flags from `wanted` that the binary's `--help` output mentions.
///
/// Failures only disable the optimization.
async fn supported_flags(binary: &Path, wanted: &[String]) -> Vec<String> {
    if wanted.is_empty() {
        return Vec::new();
    }

    let help = match Command::new(binary)
        .arg("--help")
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            text
        }
        Err(e) => {
            tracing::warn!("Could not probe {} for optional flags: {}", binary.display(), e);
            return Vec::new();
        }
    };

    wanted
        .iter()
        .filter(|flag| {
            let supported = advertises(&help, flag);
            if !supported {
                tracing::warn!("Runtime does not support {}, continuing without it", flag);
            }
            supported
        })
        .cloned()
        .collect()
}

/// Whether `help` lists `flag` as a whole token, e.g. `--vae-tiling,` or `--vae-tiling=N`.
fn advertises(help: &str, flag: &str) -> bool {
    help.split_whitespace().any(|token| {
        let token = token.trim_end_matches(',');
        token == flag || token.split_once('=').is_some_and(|(name, _)| name == flag)
    })
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join(" | ")
}
