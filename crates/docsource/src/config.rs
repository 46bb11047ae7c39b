//! Configuration for [`DocumentSource`](crate::DocumentSource).
//!
//! The config is plain data with serde support, so it can live in a TOML
//! file next to the rest of an application's settings. Every field has a
//! default; a file only needs the values it changes.
//!
//! ```toml
//! [cache]
//! dir = "/var/cache/myapp/icons"
//! max_entries = 256
//! max_age_days = 30
//!
//! [http]
//! timeout_secs = 10
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use docsource_icon::IconCacheConfig;
use docsource_net::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSourceConfig {
    /// On-disk icon cache.
    pub cache: CacheSettings,
    /// HTTP transport for manifests and icons.
    pub http: HttpSettings,
}

/// Icon cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache directory. Defaults to the platform cache dir for docsource.
    pub dir: PathBuf,
    /// Maximum number of cached icons; 0 for no limit.
    pub max_entries: usize,
    /// Byte budget for the whole cache, in megabytes.
    pub max_size_mb: u64,
    /// Icons older than this are dropped when the cache is opened.
    pub max_age_days: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = IconCacheConfig::default();
        Self {
            dir: default_cache_dir(),
            max_entries: defaults.max_entries.unwrap_or(0),
            max_size_mb: defaults.max_size_bytes / (1024 * 1024),
            max_age_days: None,
        }
    }
}

/// HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Whole-request timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
    /// Connect timeout in seconds; 0 disables it.
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
    /// Overrides the default `docsource/<version>` user agent.
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            timeout_secs: defaults.timeout.map_or(0, |t| t.as_secs()),
            connect_timeout_secs: defaults.connect_timeout.map_or(0, |t| t.as_secs()),
            max_redirects: defaults.max_redirects,
            user_agent: None,
            proxy: None,
        }
    }
}

/// The platform cache directory for docsource icons, or a directory under
/// the system temp dir when the platform has none.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("com", "docsource", "docsource")
        .map(|dirs| dirs.cache_dir().join("icons"))
        .unwrap_or_else(|| std::env::temp_dir().join("docsource-icon-cache"))
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl DocumentSourceConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Render the config as TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Save the config atomically: the file is either fully replaced or
    /// left untouched.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        let write_error = |source| Error::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
        file.write_all(content.as_bytes()).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(path).map_err(|e| write_error(e.error))?;
        Ok(())
    }

    /// The icon cache configuration these settings describe.
    pub fn icon_cache_config(&self) -> IconCacheConfig {
        let mut config = IconCacheConfig::default()
            .with_cache_dir(&self.cache.dir)
            .with_max_size_mb(self.cache.max_size_mb);
        config.max_entries = (self.cache.max_entries > 0).then_some(self.cache.max_entries);
        config.max_age = self
            .cache
            .max_age_days
            .map(|days| Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)));
        config
    }

    /// The HTTP client configuration these settings describe.
    pub fn http_client_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        HttpClientConfig {
            timeout: seconds(self.http.timeout_secs),
            connect_timeout: seconds(self.http.connect_timeout_secs),
            max_redirects: self.http.max_redirects,
            user_agent: self.http.user_agent.clone().or(defaults.user_agent),
            proxy: self.http.proxy.clone(),
            ..defaults
        }
    }
}
