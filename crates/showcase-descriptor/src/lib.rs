//! Product descriptor model shared by the asset generator and the site builder.
//!
//! This crate loads the XML product descriptor into an owned element tree,
//! discovers the `image` placeholders that need generated artwork, and writes
//! the tree back out once their `src` attributes have been rewritten.

pub mod descriptor;
pub mod placeholder;
pub mod slug;
pub mod tree;

pub use descriptor::{Descriptor, DescriptorError};
pub use placeholder::{Placeholder, MISC_SECTION, SECTION_PATHS};
pub use slug::{image_file_name, slugify, DEFAULT_SLUG_LEN};
pub use tree::{Element, Node, NodePath};
