//! Loading and writing the product descriptor.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::placeholder::{collect_placeholders, Placeholder};
use crate::tree::{parse_document, write_document, Element, NodePath};

/// A parsed product descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    root: Element,
}

/// Errors that can occur when reading or writing a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Descriptor not found: {0}")]
    NotFound(String),

    #[error("Failed to read descriptor: {0}")]
    Read(String),

    #[error("Invalid descriptor XML: {0}")]
    Parse(String),

    #[error("Failed to write descriptor: {0}")]
    Write(String),
}

impl Descriptor {
    /// Load a descriptor from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DescriptorError::NotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| DescriptorError::Read(format!("{}: {}", path.display(), e)))?;

        let descriptor = Self::parse(&content)?;
        tracing::debug!("Loaded descriptor <{}> from {}", descriptor.root.name, path.display());

        Ok(descriptor)
    }

    /// Parse a descriptor from XML text.
    pub fn parse(xml: &str) -> Result<Self, DescriptorError> {
        Ok(Self {
            root: parse_document(xml)?,
        })
    }

    /// The document's root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Element at a slash-separated path below the root, e.g. `hero/media/image`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.root.find(path)
    }

    /// Trimmed text at a path below the root, or an empty string.
    pub fn text(&self, path: &str) -> String {
        self.root.find_text(path)
    }

    /// Image placeholders in generation order.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        collect_placeholders(&self.root)
    }

    /// Mutable element at an index path (as carried by [`Placeholder::location`]).
    pub fn element_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        self.root.at_mut(path)
    }

    /// Serialize with an XML declaration.
    pub fn to_xml_string(&self) -> Result<String, DescriptorError> {
        write_document(&self.root)
    }

    /// Write the descriptor to disk, creating the parent directory if needed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DescriptorError> {
        let path = path.as_ref();
        let xml = self.to_xml_string()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DescriptorError::Write(e.to_string()))?;
        }

        fs::write(path, xml)
            .map_err(|e| DescriptorError::Write(format!("{}: {}", path.display(), e)))
    }
}

impl FromStr for Descriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
