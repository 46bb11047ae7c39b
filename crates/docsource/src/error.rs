//! Error types for the facade.

use std::io;
use std::path::PathBuf;

use docsource_icon::CacheError;
use docsource_net::NetworkError;
use thiserror::Error;

/// Errors raised while setting up a [`DocumentSource`](crate::DocumentSource)
/// or handling its configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// The config file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config is not valid TOML for [`DocumentSourceConfig`](crate::DocumentSourceConfig).
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The icon cache could not be opened.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Result type for facade setup and configuration.
pub type Result<T> = std::result::Result<T, Error>;
