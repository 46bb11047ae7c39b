//! Error types for docsource-core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a byte payload was rejected by
/// [`AttributeCodec::decode`](crate::AttributeCodec::decode).
///
/// Decoding is all-or-nothing: any of these aborts the whole decode and no
/// fields are returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptPayload {
    /// The payload is shorter than the fixed header.
    #[error("payload too short for header ({len} bytes)")]
    TruncatedHeader { len: usize },

    /// The payload does not start with the format tag.
    #[error("unrecognized format tag")]
    BadMagic,

    /// The format tag is known but the version is not.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// A length prefix or the bytes it announces run past the end.
    #[error("field `{field}` is truncated")]
    TruncatedField { field: &'static str },

    /// A field is not valid UTF-8.
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A field is present but holds a value a record can never contain.
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: RecordError,
    },

    /// Bytes remain after the last field.
    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),
}

/// Errors raised while constructing a [`crate::ProvenanceRecord`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field was empty.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// The manifest URL did not parse as an absolute URL.
    #[error("invalid manifest URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the attribute codec and store.
#[derive(Error, Debug)]
pub enum AttributeError {
    /// The encoded record does not fit in one extended attribute.
    #[error("payload of {size} bytes exceeds attribute limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// One field is longer than its length prefix can describe.
    #[error("field `{field}` is {len} bytes, longer than the {limit} byte field limit")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        limit: usize,
    },

    /// The stored attribute is not a well-formed payload.
    #[error("corrupt x-document-source payload: {0}")]
    CorruptPayload(#[from] CorruptPayload),

    /// The filesystem refused to read or write the attribute.
    #[error("extended attribute I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AttributeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error came from a malformed payload.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptPayload(_))
    }
}

/// A specialized Result type for attribute operations.
pub type Result<T> = std::result::Result<T, AttributeError>;
