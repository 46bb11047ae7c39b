//! Networking for docsource.
//!
//! This crate provides the network-facing half of icon resolution:
//!
//! - **HTTP Client**: a `reqwest`-backed GET client with sensible timeouts
//! - **Transport**: the collaborator trait the resolver downloads through,
//!   implemented by [`http::HttpClient`] and easy to fake in tests
//! - **Manifests**: fetching and parsing the JSON icon listing an
//!   application publishes, plus exact-size entry selection
//!
//! # Fetching a manifest
//!
//! ```ignore
//! use docsource_core::IconType;
//! use docsource_net::{ManifestFetcher, http::HttpClient};
//!
//! let fetcher = ManifestFetcher::new(HttpClient::new()?);
//! let url = "https://workingcopyapp.com/appInfo.json".parse()?;
//! let manifest = fetcher.fetch(&url).await?;
//!
//! if let Some(entry) = manifest.select(&IconType::Spotlight) {
//!     println!("icon at {}", entry.url());
//! }
//! ```
//!
//! # Errors
//!
//! Transport failures are [`NetworkError`]s; a body that is not a usable
//! icon listing is [`ManifestError::Parse`]. Nothing here retries.

mod error;
pub mod http;
pub mod manifest;
pub mod transport;

pub use error::{ManifestError, NetworkError, Result};
pub use manifest::{IconManifest, IconManifestEntry, ManifestFetcher};
pub use transport::Transport;
