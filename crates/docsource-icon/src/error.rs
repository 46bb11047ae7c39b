//! Error types for the icon crate.

use std::io;
use std::path::PathBuf;

use docsource_net::{ManifestError, NetworkError};
use thiserror::Error;

/// Failures of the on-disk icon cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A filesystem operation on the cache failed.
    #[error("failed to {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Why an icon could not be resolved.
///
/// Every waiter on a resolution receives its own clone of the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The manifest or the icon image could not be downloaded.
    #[error("network error: {0}")]
    Network(NetworkError),

    /// The manifest body was not a usable icon listing.
    #[error("malformed manifest: {0}")]
    Parse(String),

    /// The manifest lists no variant with this tag and exact size.
    #[error("manifest has no {icon_type} icon of size {size}")]
    NoMatchingIcon { icon_type: String, size: u32 },

    /// The downloaded bytes are not a decodable image.
    #[error("failed to decode icon: {0}")]
    Decode(String),

    /// The icon cache could not be read.
    #[error("icon cache I/O error: {0}")]
    Io(String),

    /// The resolution task ended without reporting an outcome.
    #[error("icon resolution was interrupted")]
    Interrupted,
}

impl From<NetworkError> for ResolveError {
    fn from(err: NetworkError) -> Self {
        Self::Network(err)
    }
}

impl From<ManifestError> for ResolveError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Network(err) => Self::Network(err),
            ManifestError::Parse(msg) => Self::Parse(msg),
        }
    }
}

impl From<CacheError> for ResolveError {
    fn from(err: CacheError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<image::ImageError> for ResolveError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
