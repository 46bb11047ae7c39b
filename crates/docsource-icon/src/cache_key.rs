//! Stable cache keys for resolved icons.

use std::fmt;

use docsource_core::IconType;
use sha2::{Digest, Sha256};
use url::Url;

/// Identifies one (manifest URL, icon type) resolution.
///
/// The key is the hex SHA-256 of the manifest URL, the type tag and the
/// size, so it is identical across processes and doubles as the cache file
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconCacheKey(String);

impl IconCacheKey {
    /// Length of the hex digest.
    pub const LEN: usize = 64;

    pub fn new(manifest_url: &Url, icon_type: &IconType) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(manifest_url.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(icon_type.tag().as_bytes());
        hasher.update([0u8]);
        hasher.update(icon_type.size().to_be_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Rebuild a key from a cache file name.
    ///
    /// Returns `None` for anything that is not a lowercase hex digest.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let valid = name.len() == Self::LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
