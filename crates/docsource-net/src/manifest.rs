//! Icon manifests: the remote JSON listing of an application's icon variants.
//!
//! Two body shapes are accepted:
//!
//! ```json
//! {"icons": [{"type": "spotlight", "size": 29, "url": "icon29.png"}]}
//! ```
//!
//! or the bare array of entries. Entry URLs may be relative to the
//! manifest's own URL.

use docsource_core::IconType;
use docsource_core::logging::{span_names, targets};
use serde::Deserialize;
use tracing::{Instrument, debug};
use url::Url;

use crate::error::ManifestError;
use crate::transport::Transport;

/// One icon variant listed by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconManifestEntry {
    icon_type: String,
    size: u32,
    url: Url,
}

impl IconManifestEntry {
    /// The icon type tag, e.g. `"spotlight"`.
    pub fn icon_type(&self) -> &str {
        &self.icon_type
    }

    /// Logical pixel size of the variant.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Absolute URL of the image.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether this entry is exactly the requested variant.
    pub fn matches(&self, icon_type: &IconType) -> bool {
        self.icon_type == icon_type.tag() && self.size == icon_type.size()
    }
}

/// An ordered list of icon variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconManifest {
    entries: Vec<IconManifestEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawManifest {
    Wrapped { icons: Vec<RawEntry> },
    Bare(Vec<RawEntry>),
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    icon_type: String,
    size: u32,
    url: String,
}

impl IconManifest {
    /// Parse a manifest body. Relative entry URLs resolve against `base`.
    ///
    /// Fails if the JSON is malformed, the entry list is empty, or any entry
    /// has a zero size, an empty type tag or an unusable URL.
    pub fn parse(body: &[u8], base: &Url) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_slice(body)?;
        let raw_entries = match raw {
            RawManifest::Wrapped { icons } => icons,
            RawManifest::Bare(entries) => entries,
        };

        if raw_entries.is_empty() {
            return Err(ManifestError::Parse("manifest lists no icons".into()));
        }

        let entries = raw_entries
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                if raw.icon_type.is_empty() {
                    return Err(ManifestError::Parse(format!("entry {index} has no type")));
                }
                if raw.size == 0 {
                    return Err(ManifestError::Parse(format!("entry {index} has size 0")));
                }
                let url = base.join(&raw.url).map_err(|err| {
                    ManifestError::Parse(format!("entry {index} has bad url {:?}: {err}", raw.url))
                })?;
                if url.cannot_be_a_base() {
                    return Err(ManifestError::Parse(format!(
                        "entry {index} url {url} is not fetchable"
                    )));
                }
                Ok(IconManifestEntry {
                    icon_type: raw.icon_type,
                    size: raw.size,
                    url,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// All entries, in manifest order.
    pub fn entries(&self) -> &[IconManifestEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a parsed manifest.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry with the requested tag and exactly the requested size.
    ///
    /// There is no nearest-size fallback: a manifest that only lists other
    /// sizes has no match.
    pub fn select(&self, icon_type: &IconType) -> Option<&IconManifestEntry> {
        self.entries.iter().find(|entry| entry.matches(icon_type))
    }
}

/// Downloads and parses icon manifests over a [`Transport`].
///
/// One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct ManifestFetcher<T> {
    transport: T,
}

impl<T: Transport> ManifestFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The transport, also used by callers for the icon download itself.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `manifest_url` and parse the body.
    pub async fn fetch(&self, manifest_url: &Url) -> Result<IconManifest, ManifestError> {
        let span = tracing::debug_span!(
            target: targets::MANIFEST,
            span_names::MANIFEST_FETCH,
            url = %manifest_url
        );
        async {
            debug!(target: targets::MANIFEST, "fetching manifest");
            let body = self.transport.fetch(manifest_url).await?;
            let manifest = IconManifest::parse(&body, manifest_url)?;
            debug!(
                target: targets::MANIFEST,
                entries = manifest.len(),
                "manifest parsed"
            );
            Ok(manifest)
        }
        .instrument(span)
        .await
    }
}
