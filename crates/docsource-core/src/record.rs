//! The provenance record attached to a document.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RecordError;

/// Identifies the application a document came from.
///
/// All four fields are required and non-empty. A record is immutable once
/// built; use [`ProvenanceRecord::new`] to construct one.
///
/// # Example
///
/// ```
/// use docsource_core::ProvenanceRecord;
///
/// let record = ProvenanceRecord::new(
///     "com.appliedphasor.working-copy",
///     "Working Copy",
///     "libgit2/doc/README.md",
///     "https://workingcopyapp.com/appInfo.json",
/// )?;
/// assert_eq!(record.application_name(), "Working Copy");
/// # Ok::<(), docsource_core::RecordError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct ProvenanceRecord {
    bundle_identifier: String,
    application_name: String,
    document_path: String,
    manifest_url: String,
    manifest: Url,
}

impl ProvenanceRecord {
    /// Build a record, validating every field.
    pub fn new(
        bundle_identifier: impl Into<String>,
        application_name: impl Into<String>,
        document_path: impl Into<String>,
        manifest_url: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let bundle_identifier = bundle_identifier.into();
        let application_name = application_name.into();
        let document_path = document_path.into();
        let manifest_url = manifest_url.into();

        require("bundle identifier", &bundle_identifier)?;
        require("application name", &application_name)?;
        require("document path", &document_path)?;
        require("manifest URL", &manifest_url)?;
        let manifest = parse_manifest_url(&manifest_url)?;

        Ok(Self {
            bundle_identifier,
            application_name,
            document_path,
            manifest_url,
            manifest,
        })
    }

    /// Reverse-DNS identifier of the source app, e.g. `com.appliedphasor.working-copy`.
    pub fn bundle_identifier(&self) -> &str {
        &self.bundle_identifier
    }

    /// Display name of the source app.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Path of the document inside the source app.
    pub fn document_path(&self) -> &str {
        &self.document_path
    }

    /// URL of the JSON manifest listing the app's icons, exactly as stored.
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// The manifest URL parsed. May differ textually from [`Self::manifest_url`]
    /// because parsing normalizes.
    pub fn manifest_url_parsed(&self) -> &Url {
        &self.manifest
    }
}

fn require(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.is_empty() {
        Err(RecordError::MissingField(field))
    } else {
        Ok(())
    }
}

fn parse_manifest_url(value: &str) -> Result<Url, RecordError> {
    let url = Url::parse(value).map_err(|e| RecordError::InvalidUrl(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(RecordError::InvalidUrl(format!("{value} is not a hierarchical URL")));
    }
    Ok(url)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    bundle_identifier: String,
    application_name: String,
    document_path: String,
    #[serde(alias = "appInfoURL")]
    manifest_url: String,
}

impl TryFrom<RawRecord> for ProvenanceRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Self::new(
            raw.bundle_identifier,
            raw.application_name,
            raw.document_path,
            raw.manifest_url,
        )
    }
}

impl From<ProvenanceRecord> for RawRecord {
    fn from(record: ProvenanceRecord) -> Self {
        Self {
            bundle_identifier: record.bundle_identifier,
            application_name: record.application_name,
            document_path: record.document_path,
            manifest_url: record.manifest_url,
        }
    }
}
