//! Static site builder.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use showcase_descriptor::{Descriptor, DescriptorError};
use walkdir::WalkDir;

use crate::assets::AssetPipeline;
use crate::page::PageView;
use crate::templates::{Context, Labels, TemplateEngine};

/// Configuration for building the site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Updated descriptor produced by the generate stage
    pub descriptor_path: PathBuf,

    /// Directory the generate stage wrote images to
    pub images_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Minify the stylesheet
    pub minify: bool,

    /// Document language
    pub lang: String,

    /// Button and link texts
    pub labels: Labels,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            descriptor_path: PathBuf::from("producto.updated.xml"),
            images_dir: PathBuf::from("generated_images"),
            output_dir: PathBuf::from("site"),
            minify: false,
            lang: "en".to_string(),
            labels: Labels::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of optional sections rendered
    pub sections: usize,

    /// Number of images copied into the site
    pub images: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Updated descriptor not found: {0}. Run 'showcase generate' first.")]
    DescriptorMissing(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Failed to read images: {0}")]
    ReadError(String),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct SiteBuilder {
    config: SiteConfig,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        if !self.config.descriptor_path.exists() {
            return Err(BuildError::DescriptorMissing(
                self.config.descriptor_path.display().to_string(),
            ));
        }

        // Ensure output directories exist
        for dir in [
            self.config.output_dir.clone(),
            self.config.output_dir.join("assets"),
            self.config.output_dir.join("images"),
        ] {
            fs::create_dir_all(&dir).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        let images = self.copy_images()?;

        let descriptor = Descriptor::load(&self.config.descriptor_path)?;
        let sections = self.render_index(&descriptor)?;

        self.generate_assets()?;

        let duration = start.elapsed();

        Ok(BuildResult {
            sections,
            images,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Copy generated PNGs into `images/`. A missing source directory is skipped.
    fn copy_images(&self) -> Result<usize, BuildError> {
        let source = &self.config.images_dir;
        if !source.exists() {
            tracing::warn!("Image directory not found: {}", source.display());
            return Ok(0);
        }

        let target = self.config.output_dir.join("images");
        let mut copied = 0;

        for entry in WalkDir::new(source).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| BuildError::ReadError(e.to_string()))?;
            let path = entry.path();

            let is_png = path.extension().and_then(|e| e.to_str()) == Some("png");
            if !entry.file_type().is_file() || !is_png {
                continue;
            }

            fs::copy(path, target.join(entry.file_name()))
                .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))?;
            copied += 1;
        }

        tracing::debug!("Copied {} images from {}", copied, source.display());

        Ok(copied)
    }

    /// Render and write `index.html`, returning the number of sections.
    fn render_index(&self, descriptor: &Descriptor) -> Result<usize, BuildError> {
        let generated_dir = self.config.images_dir.to_string_lossy();
        let page = PageView::from_descriptor(descriptor, &generated_dir);
        let sections = page.sections.len();

        let context = Context {
            lang: self.config.lang.clone(),
            labels: self.config.labels.clone(),
            page,
        };

        let html = self
            .templates
            .render_page(&context)
            .map_err(|e: minijinja::Error| BuildError::TemplateError(e.to_string()))?;

        fs::write(self.config.output_dir.join("index.html"), html)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(sections)
    }

    /// Write the fixed stylesheet and script.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            AssetPipeline::minify_css(&css).unwrap_or_else(|e| {
                tracing::warn!("Keeping unminified stylesheet: {}", e);
                css.clone()
            })
        } else {
            css
        };
        fs::write(assets_dir.join("style.css"), css)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        fs::write(assets_dir.join("app.js"), AssetPipeline::generate_js())
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn config(root: &Path) -> SiteConfig {
        SiteConfig {
            descriptor_path: root.join("producto.updated.xml"),
            images_dir: root.join("generated_images"),
            output_dir: root.join("site"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_descriptor_is_reported() {
        let temp = tempdir().unwrap();

        let result = SiteBuilder::new(config(temp.path())).build().await;

        assert!(matches!(result, Err(BuildError::DescriptorMissing(_))));
        assert!(!temp.path().join("site").exists());
    }

    #[tokio::test]
    async fn copies_only_pngs() {
        let temp = tempdir().unwrap();
        let generated = temp.path().join("generated_images");
        fs::create_dir_all(generated.join("nested")).unwrap();
        fs::write(generated.join("hero-dog.png"), b"png").unwrap();
        fs::write(generated.join("notes.txt"), b"txt").unwrap();
        fs::write(generated.join("nested").join("deep.png"), b"png").unwrap();
        fs::write(temp.path().join("producto.updated.xml"), "<product/>").unwrap();

        let result = SiteBuilder::new(config(temp.path())).build().await.unwrap();

        assert_eq!(result.images, 1);
        let images = temp.path().join("site").join("images");
        assert!(images.join("hero-dog.png").exists());
        assert!(!images.join("notes.txt").exists());
        assert!(!images.join("deep.png").exists());
    }

    #[tokio::test]
    async fn minify_shrinks_stylesheet() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("producto.updated.xml"), "<product/>").unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            minify: true,
            ..config(temp.path())
        });
        builder.build().await.unwrap();

        let css = fs::read_to_string(temp.path().join("site/assets/style.css")).unwrap();
        assert!(!css.contains('\n'));
    }
}
