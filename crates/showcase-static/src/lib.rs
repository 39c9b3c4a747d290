//! Static landing page builder for showcase descriptors.
//!
//! Renders the updated descriptor into a single `index.html` with a fixed
//! stylesheet, a theme toggle script and the generated images.

pub mod assets;
pub mod builder;
pub mod page;
pub mod templates;

pub use builder::{BuildError, BuildResult, SiteBuilder, SiteConfig};
pub use page::{PageView, SectionKind};
pub use templates::Labels;
