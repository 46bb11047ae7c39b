//! The [`DocumentSource`] entry point.

use std::path::Path;

use docsource_core::logging::targets;
use docsource_core::{AttributeError, AttributeStore, IconType, ProvenanceRecord};
use docsource_icon::{Icon, IconCache, IconResolver, ImageDecoder, RasterDecoder, ResolveError};
use docsource_net::Transport;
use docsource_net::http::{HttpClient, HttpClientBuilder};
use tracing::debug;
use url::Url;

use crate::config::DocumentSourceConfig;
use crate::error::Result;

/// Records where documents came from and resolves the originating app's icon.
///
/// Combines an [`AttributeStore`] for the `x-document-source` attribute
/// with an [`IconResolver`]. The two halves are independent: a record read
/// from one file can be resolved with any resolver.
///
/// # Example
///
/// ```ignore
/// use docsource::{DocumentSource, DocumentSourceConfig, IconType, ProvenanceRecord};
///
/// let source = DocumentSource::new(&DocumentSourceConfig::default())?;
///
/// let record = ProvenanceRecord::new(
///     "com.appliedphasor.working-copy",
///     "Working Copy",
///     "libgit2/doc/README.md",
///     "https://workingcopyapp.com/appInfo.json",
/// )?;
/// source.write_provenance(&record, "README.md")?;
///
/// if let Some(record) = source.read_provenance("README.md") {
///     let icon = source.resolve_icon_for(&record, &IconType::Spotlight).await?;
/// }
/// ```
pub struct DocumentSource<T = HttpClient, D = RasterDecoder> {
    store: AttributeStore,
    resolver: IconResolver<T, D>,
}

impl<T, D> Clone for DocumentSource<T, D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl DocumentSource {
    /// Build a source from configuration: filesystem attributes, an HTTP
    /// client and the on-disk icon cache.
    pub fn new(config: &DocumentSourceConfig) -> Result<Self> {
        let client = HttpClientBuilder::from_config(config.http_client_config()).build()?;
        let cache = IconCache::open(config.icon_cache_config())?;
        debug!(
            target: targets::RESOLVER,
            cache_dir = %cache.cache_dir().display(),
            "document source ready"
        );
        Ok(Self::with_parts(
            AttributeStore::filesystem(),
            IconResolver::new(client, cache),
        ))
    }
}

impl<T: Transport, D: ImageDecoder> DocumentSource<T, D> {
    /// Assemble a source from explicitly constructed parts.
    pub fn with_parts(store: AttributeStore, resolver: IconResolver<T, D>) -> Self {
        Self { store, resolver }
    }

    /// Tag `target` with `record`, replacing any previous record.
    pub fn write_provenance(
        &self,
        record: &ProvenanceRecord,
        target: impl AsRef<Path>,
    ) -> docsource_core::Result<()> {
        self.store.write(record, target)
    }

    /// The record `target` is tagged with.
    ///
    /// Absent, corrupt and unreadable attributes are all `None`; use
    /// [`read_provenance_checked`](Self::read_provenance_checked) to tell
    /// them apart.
    pub fn read_provenance(&self, target: impl AsRef<Path>) -> Option<ProvenanceRecord> {
        self.store.read(target)
    }

    pub fn read_provenance_checked(
        &self,
        target: impl AsRef<Path>,
    ) -> std::result::Result<Option<ProvenanceRecord>, AttributeError> {
        self.store.read_checked(target)
    }

    /// Remove the record from `target`. Returns whether one was present.
    pub fn remove_provenance(&self, target: impl AsRef<Path>) -> docsource_core::Result<bool> {
        self.store.remove(target)
    }

    /// Resolve the icon of `icon_type` from the manifest at `manifest_url`.
    pub async fn resolve_icon(
        &self,
        manifest_url: &Url,
        icon_type: &IconType,
    ) -> std::result::Result<Icon, ResolveError> {
        self.resolver.resolve(manifest_url, icon_type).await
    }

    /// Resolve the icon of the application that produced `record`.
    pub async fn resolve_icon_for(
        &self,
        record: &ProvenanceRecord,
        icon_type: &IconType,
    ) -> std::result::Result<Icon, ResolveError> {
        self.resolve_icon(record.manifest_url_parsed(), icon_type)
            .await
    }

    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    pub fn resolver(&self) -> &IconResolver<T, D> {
        &self.resolver
    }
}

impl<T, D> std::fmt::Debug for DocumentSource<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSource")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
