//! Persistent on-disk cache for resolved icons.
//!
//! Each entry is one file in the cache directory, named by its
//! [`IconCacheKey`] and holding the icon's encoded image bytes. Files are
//! written to a temporary file first and renamed into place, so a reader
//! never sees a partially written icon and concurrent writers of the same
//! key simply race to the last rename.
//!
//! # Example
//!
//! ```ignore
//! use docsource_icon::{IconCache, IconCacheConfig};
//!
//! let config = IconCacheConfig::default()
//!     .with_cache_dir("/var/cache/docsource/icons")
//!     .with_max_entries(256);
//!
//! let cache = IconCache::open(config)?;
//!
//! if let Some(entry) = cache.get(&key)? {
//!     // Use cached bytes
//! } else {
//!     let data = download_icon(url);
//!     cache.put(&key, &data)?;
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use docsource_core::logging::targets;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use crate::cache_key::IconCacheKey;
use crate::error::{CacheError, CacheResult};

/// Configuration for the icon cache.
#[derive(Debug, Clone)]
pub struct IconCacheConfig {
    /// Root directory for the cache.
    /// Default: system temp directory / "docsource-icon-cache".
    pub cache_dir: PathBuf,
    /// Maximum number of entries, or `None` for no count limit.
    /// Default: 512.
    pub max_entries: Option<usize>,
    /// Maximum total size of all entries in bytes.
    /// Default: 64 MB.
    pub max_size_bytes: u64,
    /// Entries older than this are dropped when the cache is opened.
    /// Never applied to a cache that is already open.
    /// Default: None.
    pub max_age: Option<Duration>,
}

impl Default for IconCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("docsource-icon-cache"),
            max_entries: Some(512),
            max_size_bytes: 64 * 1024 * 1024,
            max_age: None,
        }
    }
}

impl IconCacheConfig {
    /// Set the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = path.into();
        self
    }

    /// Set the maximum number of entries.
    #[must_use]
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Remove the entry count limit.
    #[must_use]
    pub fn without_max_entries(mut self) -> Self {
        self.max_entries = None;
        self
    }

    /// Set the maximum cache size in megabytes. Budgets past `u64::MAX`
    /// bytes saturate.
    #[must_use]
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    /// Set the maximum cache size in bytes.
    #[must_use]
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Prune entries older than `max_age` whenever the cache is opened.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Keep entries regardless of age.
    #[must_use]
    pub fn without_max_age(mut self) -> Self {
        self.max_age = None;
        self
    }
}

/// One cached icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCacheEntry {
    /// The key the entry is stored under.
    pub key: IconCacheKey,
    /// Encoded image bytes as downloaded.
    pub bytes: Bytes,
    /// When the bytes were written to the cache.
    pub fetched_at: SystemTime,
}

#[derive(Debug, Clone)]
struct EntryMeta {
    size: u64,
    fetched_at: SystemTime,
    last_accessed: SystemTime,
}

#[derive(Debug, Default)]
struct CacheIndex {
    entries: HashMap<IconCacheKey, EntryMeta>,
    current_size: u64,
}

impl CacheIndex {
    fn insert(&mut self, key: IconCacheKey, meta: EntryMeta) {
        self.current_size += meta.size;
        if let Some(old) = self.entries.insert(key, meta) {
            self.current_size -= old.size;
        }
    }

    fn remove(&mut self, key: &IconCacheKey) -> Option<EntryMeta> {
        let meta = self.entries.remove(key)?;
        self.current_size -= meta.size;
        Some(meta)
    }

    fn least_recently_used(&self) -> Option<IconCacheKey> {
        self.entries
            .iter()
            .min_by_key(|(_, meta)| meta.last_accessed)
            .map(|(key, _)| key.clone())
    }
}

struct CacheInner {
    config: IconCacheConfig,
    index: Mutex<CacheIndex>,
}

/// A persistent, size-bounded icon cache.
///
/// Cloning is cheap; clones share the same directory and index. All
/// operations take `&self` and are safe to call from many threads.
///
/// Entries never expire while the cache is open. They leave the cache only
/// through [`remove`](Self::remove), [`clear`](Self::clear), LRU eviction
/// when a new entry would exceed `max_entries` or `max_size_bytes`, or the
/// `max_age` pass at open.
#[derive(Clone)]
pub struct IconCache {
    inner: Arc<CacheInner>,
}

impl IconCache {
    /// Open (creating if needed) the cache directory and index its contents.
    pub fn open(config: IconCacheConfig) -> CacheResult<Self> {
        fs::create_dir_all(&config.cache_dir)
            .map_err(|e| CacheError::io("create cache directory", &config.cache_dir, e))?;

        let index = Self::scan_cache_dir(&config)?;
        debug!(
            target: targets::CACHE,
            dir = %config.cache_dir.display(),
            entries = index.entries.len(),
            size_bytes = index.current_size,
            "opened icon cache"
        );

        Ok(Self {
            inner: Arc::new(CacheInner {
                config,
                index: Mutex::new(index),
            }),
        })
    }

    /// Open a cache with the default configuration.
    pub fn with_defaults() -> CacheResult<Self> {
        Self::open(IconCacheConfig::default())
    }

    fn scan_cache_dir(config: &IconCacheConfig) -> CacheResult<CacheIndex> {
        let dir = fs::read_dir(&config.cache_dir)
            .map_err(|e| CacheError::io("read cache directory", &config.cache_dir, e))?;

        let now = SystemTime::now();
        let mut index = CacheIndex::default();

        for entry in dir.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            // Temp files of in-progress writes are skipped along with
            // anything else that is not a key.
            let Some(key) = IconCacheKey::from_file_name(name) else {
                continue;
            };

            let fetched_at = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if let Some(max_age) = config.max_age
                && now.duration_since(fetched_at).unwrap_or_default() > max_age
            {
                debug!(target: targets::CACHE, %key, "pruning expired icon");
                let _ = fs::remove_file(&path);
                continue;
            }

            index.insert(
                key,
                EntryMeta {
                    size: metadata.len(),
                    fetched_at,
                    last_accessed: fetched_at,
                },
            );
        }

        Ok(index)
    }

    fn entry_path(&self, key: &IconCacheKey) -> PathBuf {
        self.inner.config.cache_dir.join(key.as_str())
    }

    /// Look up an entry.
    ///
    /// A miss is `Ok(None)`. A file that vanished underneath the index is
    /// also a miss.
    pub fn get(&self, key: &IconCacheKey) -> CacheResult<Option<IconCacheEntry>> {
        let fetched_at = {
            let mut index = self.inner.index.lock();
            match index.entries.get_mut(key) {
                Some(meta) => {
                    meta.last_accessed = SystemTime::now();
                    meta.fetched_at
                }
                None => {
                    trace!(target: targets::CACHE, %key, "cache miss");
                    return Ok(None);
                }
            }
        };

        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(data) => {
                trace!(target: targets::CACHE, %key, size = data.len(), "cache hit");
                Ok(Some(IconCacheEntry {
                    key: key.clone(),
                    bytes: Bytes::from(data),
                    fetched_at,
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(target: targets::CACHE, %key, "cache file missing, dropping entry");
                self.inner.index.lock().remove(key);
                Ok(None)
            }
            Err(e) => Err(CacheError::io("read cache file", path, e)),
        }
    }

    /// Store `data` under `key`, replacing any previous entry.
    ///
    /// Least recently used entries are evicted to make room. Data larger
    /// than the whole byte budget is not stored.
    pub fn put(&self, key: &IconCacheKey, data: &[u8]) -> CacheResult<()> {
        let size = data.len() as u64;
        let config = &self.inner.config;

        if size > config.max_size_bytes || config.max_entries == Some(0) {
            debug!(
                target: targets::CACHE,
                %key,
                size,
                "icon exceeds cache budget, not storing"
            );
            return Ok(());
        }

        let path = self.entry_path(key);
        let mut file = NamedTempFile::new_in(&config.cache_dir)
            .map_err(|e| CacheError::io("create temporary cache file", &config.cache_dir, e))?;
        file.write_all(data)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| CacheError::io("write temporary cache file", file.path(), e))?;
        file.persist(&path)
            .map_err(|e| CacheError::io("persist cache file", &path, e.error))?;

        let mut index = self.inner.index.lock();
        index.remove(key);

        while !index.entries.is_empty()
            && (index.current_size + size > config.max_size_bytes
                || config
                    .max_entries
                    .is_some_and(|max| index.entries.len() >= max))
        {
            let Some(victim) = index.least_recently_used() else {
                break;
            };
            index.remove(&victim);
            debug!(target: targets::CACHE, key = %victim, "evicting icon");
            let _ = fs::remove_file(self.entry_path(&victim));
        }

        let now = SystemTime::now();
        index.insert(
            key.clone(),
            EntryMeta {
                size,
                fetched_at: now,
                last_accessed: now,
            },
        );
        trace!(target: targets::CACHE, %key, size, "stored icon");

        Ok(())
    }

    /// Check if a key is cached.
    pub fn contains(&self, key: &IconCacheKey) -> bool {
        self.inner.index.lock().entries.contains_key(key)
    }

    /// Remove an entry. Returns whether it was present.
    pub fn remove(&self, key: &IconCacheKey) -> CacheResult<bool> {
        let removed = self.inner.index.lock().remove(key).is_some();
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(removed),
            Err(e) => Err(CacheError::io("delete cache file", path, e)),
        }
    }

    /// Remove every entry.
    pub fn clear(&self) -> CacheResult<()> {
        let mut index = self.inner.index.lock();
        for key in index.entries.keys() {
            let path = self.entry_path(key);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io("delete cache file", path, e)),
            }
        }
        *index = CacheIndex::default();
        Ok(())
    }

    /// Get the number of entries in the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.index.lock().entries.len()
    }

    /// Check if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.index.lock().entries.is_empty()
    }

    /// Get the current cache size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.inner.index.lock().current_size
    }

    /// Get the cache directory path.
    #[inline]
    pub fn cache_dir(&self) -> &Path {
        &self.inner.config.cache_dir
    }

    /// Get the configuration the cache was opened with.
    pub fn config(&self) -> &IconCacheConfig {
        &self.inner.config
    }

    /// Get cache statistics.
    pub fn stats(&self) -> IconCacheStats {
        let index = self.inner.index.lock();
        IconCacheStats {
            entries: index.entries.len(),
            size_bytes: index.current_size,
            max_entries: self.inner.config.max_entries,
            max_size_bytes: self.inner.config.max_size_bytes,
            cache_dir: self.inner.config.cache_dir.clone(),
        }
    }
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("IconCache")
            .field("entries", &stats.entries)
            .field("size_bytes", &stats.size_bytes)
            .field("max_size_bytes", &stats.max_size_bytes)
            .field("cache_dir", &stats.cache_dir)
            .finish()
    }
}

/// Statistics about the icon cache.
#[derive(Debug, Clone)]
pub struct IconCacheStats {
    /// Number of entries in the cache.
    pub entries: usize,
    /// Current size in bytes.
    pub size_bytes: u64,
    /// Entry count limit.
    pub max_entries: Option<usize>,
    /// Maximum size in bytes.
    pub max_size_bytes: u64,
    /// Cache directory path.
    pub cache_dir: PathBuf,
}

impl IconCacheStats {
    /// Get the usage percentage of the byte budget (0.0 to 100.0).
    pub fn usage_percent(&self) -> f64 {
        if self.max_size_bytes == 0 {
            0.0
        } else {
            (self.size_bytes as f64 / self.max_size_bytes as f64) * 100.0
        }
    }
}
