//! Configuration types for pdbsearch.
//!
//! [`ClientConfig::load`] reads `~/.config/pdbsearch/config.toml`, creating it
//! with hardcoded defaults if it does not yet exist, then applies
//! `PDBSEARCH_*` environment overrides (`PDBSEARCH_HTTP__TIMEOUT_SECS=5`).
//! [`ClientConfig::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[service]
base_url            = "https://search.rcsb.org"
query_path          = "/rcsbsearch/v2/query"
structure_schema_url = "https://search.rcsb.org/rcsbsearch/v2/metadata/schema"
chemical_schema_url  = "https://search.rcsb.org/rcsbsearch/v2/metadata/chemical/schema"
upload_url          = "https://user-upload.rcsb.org/v1/putMultipart"
download_url        = "https://user-upload.rcsb.org/v1/download/"

[http]
timeout_secs        = 60
requests_per_second = 10
user_agent          = "pdbsearch/0.1"

[paging]
rows = 10000
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level client configuration, loaded from `~/.config/pdbsearch/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

/// `[service]` section: where the search service and its schemas live.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_query_path")]
    pub query_path: String,
    #[serde(default = "default_structure_schema_url")]
    pub structure_schema_url: String,
    #[serde(default = "default_chemical_schema_url")]
    pub chemical_schema_url: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default = "default_download_url")]
    pub download_url: String,
}

fn default_base_url() -> String { "https://search.rcsb.org".to_string() }
fn default_query_path() -> String { "/rcsbsearch/v2/query".to_string() }
fn default_structure_schema_url() -> String {
    "https://search.rcsb.org/rcsbsearch/v2/metadata/schema".to_string()
}
fn default_chemical_schema_url() -> String {
    "https://search.rcsb.org/rcsbsearch/v2/metadata/chemical/schema".to_string()
}
fn default_upload_url() -> String { "https://user-upload.rcsb.org/v1/putMultipart".to_string() }
fn default_download_url() -> String { "https://user-upload.rcsb.org/v1/download/".to_string() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query_path: default_query_path(),
            structure_schema_url: default_structure_schema_url(),
            chemical_schema_url: default_chemical_schema_url(),
            upload_url: default_upload_url(),
            download_url: default_download_url(),
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on requests issued per second by one transport. 0 disables
    /// throttling.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 { 60 }
fn default_requests_per_second() -> u32 { 10 }
fn default_user_agent() -> String { "pdbsearch/0.1".to_string() }

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            user_agent: default_user_agent(),
        }
    }
}

/// `[paging]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    /// Default page size for sessions that do not set their own.
    #[serde(default = "default_rows")]
    pub rows: usize,
}

fn default_rows() -> usize { 10_000 }

impl Default for PagingConfig {
    fn default() -> Self {
        Self { rows: default_rows() }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ClientConfig {
    /// Load from `~/.config/pdbsearch/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load from an explicit file, layered on top of the built-in defaults and
    /// followed by environment overrides. A missing file is not an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("PDBSEARCH").separator("__"))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Full URL of the query endpoint.
    pub fn query_url(&self) -> String {
        format!(
            "{}{}",
            self.service.base_url.trim_end_matches('/'),
            self.service.query_path
        )
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("pdbsearch")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
