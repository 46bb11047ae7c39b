//! Single-flight icon resolution.
//!
//! [`IconResolver::resolve`] turns a manifest URL and an [`IconType`] into a
//! decoded [`Icon`]:
//!
//! 1. the on-disk [`IconCache`] is consulted; a hit is decoded and returned
//! 2. on a miss the manifest is fetched, the exact-size entry selected, the
//!    image fetched and decoded
//! 3. a decoded image is written to the cache, then handed to every caller
//!    that asked for the same key in the meantime
//!
//! Concurrent requests for the same (manifest URL, icon type) share one
//! resolution: the first caller starts it and later callers wait for its
//! outcome instead of touching the network. Errors go to every waiter and
//! are never cached, so the next request tries again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use docsource_core::IconType;
use docsource_core::logging::{span_names, targets};
use docsource_net::{ManifestFetcher, Transport};
use image::RgbaImage;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{Instrument, debug, warn};
use url::Url;

use crate::cache_key::IconCacheKey;
use crate::decode::{Icon, ImageDecoder, RasterDecoder};
use crate::disk_cache::IconCache;
use crate::error::ResolveError;

type Outcome = Result<Icon, ResolveError>;
type Waiters = Vec<oneshot::Sender<Outcome>>;

struct ResolverInner<T, D> {
    fetcher: ManifestFetcher<T>,
    cache: Option<IconCache>,
    decoder: D,
    runtime: Option<Handle>,
    in_flight: Mutex<HashMap<IconCacheKey, Waiters>>,
}

/// Resolves application icons from their manifests, with caching and
/// deduplication of concurrent identical requests.
///
/// Cloning is cheap; clones share the cache and the in-flight table.
///
/// # Example
///
/// ```ignore
/// use docsource_core::IconType;
/// use docsource_icon::{IconCache, IconResolver};
/// use docsource_net::http::HttpClient;
///
/// let resolver = IconResolver::builder(HttpClient::new()?)
///     .cache(IconCache::with_defaults()?)
///     .build();
///
/// let url = record.manifest_url_parsed();
/// let icon = resolver.resolve(url, &IconType::Spotlight).await?;
/// println!("{}x{}", icon.width(), icon.height());
/// ```
pub struct IconResolver<T, D = RasterDecoder> {
    inner: Arc<ResolverInner<T, D>>,
}

impl<T, D> Clone for IconResolver<T, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> IconResolver<T> {
    /// Create a builder for a resolver downloading through `transport`.
    pub fn builder(transport: T) -> IconResolverBuilder<T> {
        IconResolverBuilder::new(transport)
    }

    /// A resolver with the default decoder, backed by `cache`.
    pub fn new(transport: T, cache: IconCache) -> Self {
        Self::builder(transport).cache(cache).build()
    }
}

impl<T: Transport, D: ImageDecoder> IconResolver<T, D> {
    /// Resolve the icon of `icon_type` listed by the manifest at
    /// `manifest_url`.
    ///
    /// The work runs on the configured runtime (or the current one), so the
    /// outcome is produced even if this future is dropped. Outside any
    /// tokio runtime the work runs inline on this future instead.
    pub async fn resolve(&self, manifest_url: &Url, icon_type: &IconType) -> Outcome {
        let key = IconCacheKey::new(manifest_url, icon_type);
        let (tx, rx) = oneshot::channel();

        let leader = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.get_mut(&key) {
                Some(waiters) => {
                    waiters.push(tx);
                    false
                }
                None => {
                    in_flight.insert(key.clone(), vec![tx]);
                    true
                }
            }
        };

        if leader {
            let span = tracing::debug_span!(
                target: targets::RESOLVER,
                span_names::RESOLVE,
                url = %manifest_url,
                icon_type = %icon_type
            );
            let flight = Flight {
                inner: Arc::clone(&self.inner),
                key,
                completed: false,
            };
            let job = flight
                .run(manifest_url.clone(), icon_type.clone())
                .instrument(span);

            match self
                .inner
                .runtime
                .clone()
                .or_else(|| Handle::try_current().ok())
            {
                Some(handle) => {
                    handle.spawn(job);
                }
                None => job.await,
            }
        } else {
            debug!(target: targets::RESOLVER, %key, "joined in-flight resolution");
        }

        rx.await.unwrap_or(Err(ResolveError::Interrupted))
    }

    /// Number of keys currently being resolved.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// The cache backing this resolver, if any.
    pub fn cache(&self) -> Option<&IconCache> {
        self.inner.cache.as_ref()
    }
}

impl<T, D> fmt::Debug for IconResolver<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconResolver")
            .field("cache", &self.inner.cache)
            .field("in_flight", &self.inner.in_flight.lock().len())
            .finish_non_exhaustive()
    }
}

impl<T: Transport, D: ImageDecoder> ResolverInner<T, D> {
    async fn resolve_uncached(
        self: &Arc<Self>,
        key: &IconCacheKey,
        manifest_url: &Url,
        icon_type: &IconType,
    ) -> Outcome {
        let cached = {
            let key = key.clone();
            self.blocking(move |inner| inner.cached_icon(&key)).await??
        };
        if let Some(icon) = cached {
            return Ok(icon);
        }

        debug!(target: targets::RESOLVER, %key, "cache miss, fetching manifest");
        let manifest = self.fetcher.fetch(manifest_url).await?;
        let entry = manifest
            .select(icon_type)
            .ok_or_else(|| ResolveError::NoMatchingIcon {
                icon_type: icon_type.tag().to_string(),
                size: icon_type.size(),
            })?;

        debug!(target: targets::RESOLVER, url = %entry.url(), "fetching icon");
        let bytes = self.fetcher.transport().fetch(entry.url()).await?;

        let key = key.clone();
        let encoded = bytes.clone();
        let image = self
            .blocking(move |inner| inner.decode_and_store(&key, &encoded))
            .await??;

        Ok(Icon::new(image, bytes, false))
    }

    /// Run `f` on the runtime's blocking pool so decoding and cache I/O never
    /// occupy an async worker. Outside a runtime `f` runs in place.
    async fn blocking<R, F>(self: &Arc<Self>, f: F) -> Result<R, ResolveError>
    where
        F: FnOnce(&Self) -> R + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(self);
        match Handle::try_current() {
            Ok(handle) => handle
                .spawn_blocking(move || f(&inner))
                .await
                .map_err(|err| {
                    warn!(target: targets::RESOLVER, %err, "blocking resolution step failed");
                    ResolveError::Interrupted
                }),
            Err(_) => Ok(f(&inner)),
        }
    }

    /// Decode freshly downloaded bytes and, once they are known to be a valid
    /// image, persist them. A failed write is logged and does not fail the
    /// resolution.
    fn decode_and_store(
        &self,
        key: &IconCacheKey,
        bytes: &Bytes,
    ) -> Result<RgbaImage, ResolveError> {
        let image = self.decoder.decode(bytes)?;

        if let Some(cache) = &self.cache
            && let Err(err) = cache.put(key, bytes)
        {
            warn!(target: targets::RESOLVER, %key, %err, "failed to cache icon");
        }

        Ok(image)
    }

    /// A decodable cached icon, if there is one. Undecodable entries are
    /// dropped from the cache and count as a miss.
    fn cached_icon(&self, key: &IconCacheKey) -> Result<Option<Icon>, ResolveError> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(entry) = cache.get(key)? else {
            return Ok(None);
        };

        match self.decoder.decode(&entry.bytes) {
            Ok(image) => {
                debug!(target: targets::RESOLVER, %key, "cache hit");
                Ok(Some(Icon::new(image, entry.bytes, true)))
            }
            Err(err) => {
                warn!(
                    target: targets::RESOLVER,
                    %key,
                    %err,
                    "discarding undecodable cached icon"
                );
                if let Err(err) = cache.remove(key) {
                    warn!(target: targets::RESOLVER, %key, %err, "failed to remove cached icon");
                }
                Ok(None)
            }
        }
    }
}

/// Ownership of one in-flight key.
///
/// Dropping a flight that never completed (the task panicked or its future
/// was dropped) clears the key, which drops the waiters' senders and wakes
/// them with [`ResolveError::Interrupted`].
struct Flight<T, D> {
    inner: Arc<ResolverInner<T, D>>,
    key: IconCacheKey,
    completed: bool,
}

impl<T: Transport, D: ImageDecoder> Flight<T, D> {
    async fn run(mut self, manifest_url: Url, icon_type: IconType) {
        debug!(target: targets::RESOLVER, key = %self.key, "starting resolution");
        let outcome = self
            .inner
            .resolve_uncached(&self.key, &manifest_url, &icon_type)
            .await;
        self.complete(outcome);
    }

    fn complete(&mut self, outcome: Outcome) {
        // The cache is already written, so a request arriving after this
        // removal finds the icon there.
        let waiters = self
            .inner
            .in_flight
            .lock()
            .remove(&self.key)
            .unwrap_or_default();
        self.completed = true;

        match &outcome {
            Ok(icon) => debug!(
                target: targets::RESOLVER,
                key = %self.key,
                waiters = waiters.len(),
                from_cache = icon.from_cache(),
                "resolution complete"
            ),
            Err(err) => debug!(
                target: targets::RESOLVER,
                key = %self.key,
                waiters = waiters.len(),
                %err,
                "resolution failed"
            ),
        }

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl<T, D> Drop for Flight<T, D> {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                target: targets::RESOLVER,
                key = %self.key,
                "resolution ended without an outcome"
            );
            self.inner.in_flight.lock().remove(&self.key);
        }
    }
}

/// Builder for [`IconResolver`].
pub struct IconResolverBuilder<T, D = RasterDecoder> {
    transport: T,
    cache: Option<IconCache>,
    decoder: D,
    runtime: Option<Handle>,
}

impl<T: Transport> IconResolverBuilder<T> {
    /// Start a builder with no cache and the default decoder.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: None,
            decoder: RasterDecoder,
            runtime: None,
        }
    }
}

impl<T: Transport, D: ImageDecoder> IconResolverBuilder<T, D> {
    /// Persist resolved icons in `cache`. Without a cache every resolution
    /// goes to the network.
    pub fn cache(mut self, cache: IconCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a different image decoder.
    pub fn decoder<D2: ImageDecoder>(self, decoder: D2) -> IconResolverBuilder<T, D2> {
        IconResolverBuilder {
            transport: self.transport,
            cache: self.cache,
            decoder,
            runtime: self.runtime,
        }
    }

    /// Run resolutions on this runtime instead of the caller's.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> IconResolver<T, D> {
        IconResolver {
            inner: Arc::new(ResolverInner {
                fetcher: ManifestFetcher::new(self.transport),
                cache: self.cache,
                decoder: self.decoder,
                runtime: self.runtime,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }
}
