//! docsource - tag files with the app they came from, and show that app's icon.
//!
//! This is the main umbrella crate. It re-exports the core record and
//! attribute types, exposes the networking and icon crates as modules, and
//! adds [`DocumentSource`], which wires them together from a
//! [`DocumentSourceConfig`].
//!
//! # Example
//!
//! ```no_run
//! use docsource::{DocumentSource, DocumentSourceConfig, IconType, ProvenanceRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = DocumentSource::new(&DocumentSourceConfig::default())?;
//!
//!     let record = ProvenanceRecord::new(
//!         "com.appliedphasor.working-copy",
//!         "Working Copy",
//!         "libgit2/doc/README.md",
//!         "https://workingcopyapp.com/appInfo.json",
//!     )?;
//!     source.write_provenance(&record, "README.md")?;
//!
//!     if let Some(record) = source.read_provenance("README.md") {
//!         let icon = source.resolve_icon_for(&record, &IconType::Spotlight).await?;
//!         println!("{} icon: {}x{}", record.application_name(), icon.width(), icon.height());
//!     }
//!     Ok(())
//! }
//! ```

pub use docsource_core::*;

/// HTTP transport and icon manifests.
pub mod net {
    pub use docsource_net::*;
}

/// Icon cache and resolver.
pub mod icon {
    pub use docsource_icon::*;
}

pub mod config;
mod error;
mod source;

pub use config::DocumentSourceConfig;
pub use error::{Error, Result};
pub use source::DocumentSource;
