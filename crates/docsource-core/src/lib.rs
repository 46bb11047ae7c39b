//! Core types for docsource.
//!
//! This crate provides the file-side half of docsource:
//!
//! - **ProvenanceRecord**: which app produced a document, under what path,
//!   and where that app's icon manifest lives
//! - **AttributeCodec**: a compact, versioned byte encoding of a record that
//!   fits in one extended attribute and rejects corrupt input wholesale
//! - **AttributeStore**: reads and writes the `x-document-source` attribute
//!   through a pluggable [`ExtendedAttributes`] backend
//! - **IconType**: the icon variants a manifest can list
//!
//! # Example
//!
//! ```
//! use docsource_core::{AttributeStore, MemoryAttributes, ProvenanceRecord};
//!
//! let store = AttributeStore::new(MemoryAttributes::new());
//! let record = ProvenanceRecord::new(
//!     "com.appliedphasor.working-copy",
//!     "Working Copy",
//!     "libgit2/doc/README.md",
//!     "https://workingcopyapp.com/appInfo.json",
//! )
//! .unwrap();
//!
//! store.write(&record, "README.md").unwrap();
//! assert_eq!(store.read("README.md"), Some(record));
//! assert_eq!(store.read("other.md"), None);
//! ```

pub mod attribute;
pub mod codec;
mod error;
mod icon_type;
pub mod logging;
mod record;

#[cfg(unix)]
pub use attribute::FsAttributes;
pub use attribute::{ATTRIBUTE_NAME, AttributeStore, ExtendedAttributes, MemoryAttributes};
pub use codec::AttributeCodec;
pub use error::{AttributeError, CorruptPayload, RecordError, Result};
pub use icon_type::IconType;
pub use record::ProvenanceRecord;
