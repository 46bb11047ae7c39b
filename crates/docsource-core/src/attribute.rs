//! Reading and writing the `x-document-source` extended attribute.
//!
//! [`AttributeStore`] glues [`AttributeCodec`] to an [`ExtendedAttributes`]
//! backend. Two backends ship with the crate:
//!
//! - [`FsAttributes`] talks to the real filesystem (unix only).
//! - [`MemoryAttributes`] keeps attributes in process memory, for tests and
//!   platforms without extended attribute support.
//!
//! # Example
//!
//! ```no_run
//! use docsource_core::{AttributeStore, ProvenanceRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = AttributeStore::filesystem();
//! let record = ProvenanceRecord::new(
//!     "com.appliedphasor.working-copy",
//!     "Working Copy",
//!     "libgit2/doc/README.md",
//!     "https://workingcopyapp.com/appInfo.json",
//! )?;
//!
//! store.write(&record, "README.md")?;
//! assert_eq!(store.read("README.md"), Some(record));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::{AttributeCodec, DEFAULT_MAX_PAYLOAD};
use crate::error::{AttributeError, Result};
use crate::logging::targets;
use crate::record::ProvenanceRecord;

/// Name of the extended attribute holding a provenance record.
pub const ATTRIBUTE_NAME: &str = "x-document-source";

/// A filesystem's named-attribute primitive.
///
/// Implementations must be usable from several threads at once.
pub trait ExtendedAttributes: Send + Sync {
    /// Read attribute `name` of `path`. `Ok(None)` means the attribute is absent.
    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Create or replace attribute `name` of `path`.
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()>;

    /// Remove attribute `name` of `path`, returning whether it existed.
    fn remove(&self, path: &Path, name: &str) -> io::Result<bool>;

    /// Largest value this backend accepts for one attribute.
    fn max_value_len(&self) -> usize {
        DEFAULT_MAX_PAYLOAD
    }
}

impl<T: ExtendedAttributes + ?Sized> ExtendedAttributes for Arc<T> {
    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).get(path, name)
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        (**self).set(path, name, value)
    }

    fn remove(&self, path: &Path, name: &str) -> io::Result<bool> {
        (**self).remove(path, name)
    }

    fn max_value_len(&self) -> usize {
        (**self).max_value_len()
    }
}

/// Extended attributes backed by the host filesystem.
///
/// Linux and the BSDs only allow unprivileged attributes in the `user.`
/// namespace, so names are prefixed there. macOS takes names verbatim.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttributes;

#[cfg(unix)]
impl FsAttributes {
    /// Whether the current platform supports extended attributes at all.
    pub fn is_supported() -> bool {
        xattr::SUPPORTED_PLATFORM
    }

    fn platform_name(name: &str) -> std::borrow::Cow<'_, str> {
        if cfg!(target_os = "macos") || cfg!(target_os = "ios") {
            name.into()
        } else {
            format!("user.{name}").into()
        }
    }
}

#[cfg(unix)]
impl ExtendedAttributes for FsAttributes {
    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        xattr::get(path, Self::platform_name(name).as_ref())
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        xattr::set(path, Self::platform_name(name).as_ref(), value)
    }

    fn remove(&self, path: &Path, name: &str) -> io::Result<bool> {
        match xattr::remove(path, Self::platform_name(name).as_ref()) {
            Ok(()) => Ok(true),
            Err(err) if is_missing_attribute(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// errno reported when the named attribute does not exist.
#[cfg(any(target_os = "linux", target_os = "android"))]
const NO_ATTRIBUTE: Option<i32> = Some(libc::ENODATA);
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd"
))]
const NO_ATTRIBUTE: Option<i32> = Some(libc::ENOATTR);
#[cfg(all(
    unix,
    not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd"
    ))
))]
const NO_ATTRIBUTE: Option<i32> = None;

#[cfg(unix)]
fn is_missing_attribute(err: &io::Error) -> bool {
    NO_ATTRIBUTE.is_some() && err.raw_os_error() == NO_ATTRIBUTE
}

/// Extended attributes kept in memory, keyed by path.
///
/// Paths are used as given; no canonicalization is performed. Failures can
/// be injected per path with [`MemoryAttributes::fail_path`].
#[derive(Debug, Default)]
pub struct MemoryAttributes {
    values: Mutex<HashMap<(PathBuf, String), Vec<u8>>>,
    failing: Mutex<HashMap<PathBuf, io::ErrorKind>>,
    max_value_len: Option<usize>,
}

impl MemoryAttributes {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the size of a single attribute value.
    #[must_use]
    pub fn with_max_value_len(mut self, len: usize) -> Self {
        self.max_value_len = Some(len);
        self
    }

    /// Store raw bytes directly, bypassing the codec.
    pub fn insert_raw(&self, path: impl Into<PathBuf>, name: &str, value: impl Into<Vec<u8>>) {
        self.values
            .lock()
            .insert((path.into(), name.to_string()), value.into());
    }

    /// Make every operation on `path` fail with `kind`.
    pub fn fail_path(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) {
        self.failing.lock().insert(path.into(), kind);
    }

    fn check(&self, path: &Path) -> io::Result<()> {
        match self.failing.lock().get(path) {
            Some(kind) => Err(io::Error::new(*kind, "injected attribute failure")),
            None => Ok(()),
        }
    }
}

impl ExtendedAttributes for MemoryAttributes {
    fn get(&self, path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        self.check(path)?;
        Ok(self
            .values
            .lock()
            .get(&(path.to_path_buf(), name.to_string()))
            .cloned())
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        self.check(path)?;
        if value.len() > self.max_value_len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "attribute value exceeds backend limit",
            ));
        }
        self.values
            .lock()
            .insert((path.to_path_buf(), name.to_string()), value.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path, name: &str) -> io::Result<bool> {
        self.check(path)?;
        Ok(self
            .values
            .lock()
            .remove(&(path.to_path_buf(), name.to_string()))
            .is_some())
    }

    fn max_value_len(&self) -> usize {
        self.max_value_len.unwrap_or(DEFAULT_MAX_PAYLOAD)
    }
}

/// Reads and writes provenance records on files.
///
/// The store is cheaply cloneable; clones share the same backend.
#[derive(Clone)]
pub struct AttributeStore {
    backend: Arc<dyn ExtendedAttributes>,
    codec: AttributeCodec,
}

impl AttributeStore {
    /// Create a store over any backend. The codec ceiling follows the
    /// backend's [`ExtendedAttributes::max_value_len`].
    pub fn new(backend: impl ExtendedAttributes + 'static) -> Self {
        let codec = AttributeCodec::new(backend.max_value_len());
        Self {
            backend: Arc::new(backend),
            codec,
        }
    }

    /// Create a store over the host filesystem, or an in-memory backend on
    /// platforms without extended attributes.
    pub fn filesystem() -> Self {
        #[cfg(unix)]
        {
            Self::new(FsAttributes)
        }
        #[cfg(not(unix))]
        {
            Self::new(MemoryAttributes::new())
        }
    }

    /// Get the codec used by this store.
    pub fn codec(&self) -> &AttributeCodec {
        &self.codec
    }

    /// Write `record` to `target`, replacing any existing record.
    pub fn write(&self, record: &ProvenanceRecord, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        let payload = self.codec.encode(record)?;
        self.backend
            .set(target, ATTRIBUTE_NAME, &payload)
            .map_err(|e| AttributeError::io(target, e))?;

        tracing::debug!(
            target: targets::ATTRIBUTE,
            path = %target.display(),
            bundle = record.bundle_identifier(),
            bytes = payload.len(),
            "wrote provenance attribute"
        );
        Ok(())
    }

    /// Read the record on `target`.
    ///
    /// Returns `None` when the file has no record, and also when the stored
    /// payload is corrupt or cannot be read. Use [`AttributeStore::read_checked`]
    /// to tell those cases apart.
    pub fn read(&self, target: impl AsRef<Path>) -> Option<ProvenanceRecord> {
        let target = target.as_ref();
        match self.read_checked(target) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    target: targets::ATTRIBUTE,
                    path = %target.display(),
                    error = %err,
                    "ignoring unreadable provenance attribute"
                );
                None
            }
        }
    }

    /// Read the record on `target`, reporting corruption and I/O failures.
    ///
    /// `Ok(None)` means the attribute is absent.
    pub fn read_checked(&self, target: impl AsRef<Path>) -> Result<Option<ProvenanceRecord>> {
        let target = target.as_ref();
        let Some(payload) = self
            .backend
            .get(target, ATTRIBUTE_NAME)
            .map_err(|e| AttributeError::io(target, e))?
        else {
            tracing::trace!(target: targets::ATTRIBUTE, path = %target.display(), "no provenance attribute");
            return Ok(None);
        };

        let record = AttributeCodec::decode(&payload)?;
        Ok(Some(record))
    }

    /// Remove the record from `target`, returning whether one was present.
    pub fn remove(&self, target: impl AsRef<Path>) -> Result<bool> {
        let target = target.as_ref();
        self.backend
            .remove(target, ATTRIBUTE_NAME)
            .map_err(|e| AttributeError::io(target, e))
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("codec", &self.codec)
            .finish()
    }
}
