//! Icon resolution for docsource.
//!
//! Given the manifest URL recovered from a file's provenance record, this
//! crate produces the originating application's icon:
//!
//! - [`IconResolver`]: fetches the manifest, selects the exact-size entry,
//!   downloads and decodes the image, and shares one resolution among all
//!   concurrent callers asking for the same icon
//! - [`IconCache`]: a persistent, LRU-bounded directory of icon bytes that
//!   survives process restarts
//! - [`ImageDecoder`]: the decoding seam, with [`RasterDecoder`] backed by
//!   the `image` crate
//!
//! # Example
//!
//! ```ignore
//! use docsource_core::IconType;
//! use docsource_icon::{IconCache, IconCacheConfig, IconResolver};
//! use docsource_net::http::HttpClient;
//!
//! let cache = IconCache::open(IconCacheConfig::default().with_cache_dir(dir))?;
//! let resolver = IconResolver::new(HttpClient::new()?, cache);
//!
//! let icon = resolver
//!     .resolve(record.manifest_url_parsed(), &IconType::Spotlight)
//!     .await?;
//! ```

mod cache_key;
mod decode;
pub mod disk_cache;
mod error;
pub mod resolver;

pub use cache_key::IconCacheKey;
pub use decode::{Icon, ImageDecoder, RasterDecoder};
pub use disk_cache::{IconCache, IconCacheConfig, IconCacheEntry, IconCacheStats};
pub use error::{CacheError, CacheResult, ResolveError};
pub use resolver::{IconResolver, IconResolverBuilder};
