//! Showcase CLI - product descriptor to landing page.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "showcase")]
#[command(about = "Generate images for a product descriptor and build its landing page")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to showcase.toml config file
    #[arg(short, long, default_value = "showcase.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default showcase.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate prompts and images, then write the updated descriptor
    Generate,

    /// Build the static landing page from the updated descriptor
    Build {
        /// Output directory (defaults to config or "site")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minify the stylesheet
        #[arg(long)]
        minify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Generate => {
            commands::generate::run(&cli.config).await?;
        }
        Commands::Build { output, minify } => {
            let minify = if minify { Some(true) } else { None };
            commands::build::run(&cli.config, output, minify).await?;
        }
    }

    Ok(())
}
