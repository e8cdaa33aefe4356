//! Configuration types shared across crates.

use crate::passphrase::{DEFAULT_WORD_COUNT, MAX_WORD_COUNT};
use crate::slug::SlugStyle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host or IP to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Directory of read-only stock pages.
    #[serde(default = "default_stock_dir")]
    pub stock_dir: PathBuf,
    /// Name shown in page titles and the header.
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// Expose `/metrics` for Prometheus scraping.
    /// Restrict this endpoint at the network level when enabled.
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_stock_dir() -> PathBuf {
    PathBuf::from("./stock")
}

fn default_site_name() -> String {
    "txtpages".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            static_dir: default_static_dir(),
            stock_dir: default_stock_dir(),
            site_name: default_site_name(),
            metrics_enabled: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bind.trim().is_empty() {
            return Err("server.bind cannot be empty".to_string());
        }
        if self.site_name.trim().is_empty() {
            return Err("server.site_name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Page store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("txtpages.db")
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.busy_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("store.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Expiry sweep configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Run the background sweeper at all.
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,
    /// Seconds between sweeps (default: 1 day).
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
    /// Pages unread for this many days are purged (default: 180).
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Sweep once immediately instead of waiting a full interval.
    #[serde(default)]
    pub run_on_startup: bool,
}

fn default_sweep_enabled() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    86_400
}

fn default_retention_days() -> u32 {
    180
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval_secs: default_sweep_interval_secs(),
            retention_days: default_retention_days(),
            run_on_startup: false,
        }
    }
}

impl SweepConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    pub fn retention(&self) -> time::Duration {
        time::Duration::days(i64::from(self.retention_days))
    }

    pub fn validate(&self) -> Result<(), String> {
        // tokio::time::interval panics on a zero period
        if self.interval_secs == 0 {
            return Err("sweep.interval_secs must be at least 1".to_string());
        }
        if self.interval_secs > i64::MAX as u64 {
            return Err(format!(
                "sweep.interval_secs {} exceeds maximum value {}",
                self.interval_secs,
                i64::MAX
            ));
        }
        if self.retention_days == 0 {
            return Err("sweep.retention_days must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Edit secret generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Words per generated pass-phrase.
    #[serde(default = "default_secret_words")]
    pub words: usize,
}

fn default_secret_words() -> usize {
    DEFAULT_WORD_COUNT
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            words: default_secret_words(),
        }
    }
}

impl SecretConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_WORD_COUNT).contains(&self.words) {
            return Err(format!(
                "secret.words must be between 1 and {MAX_WORD_COUNT}, got {}",
                self.words
            ));
        }
        Ok(())
    }
}

/// Slug normalization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SlugConfig {
    #[serde(default)]
    pub style: SlugStyle,
}

impl SlugConfig {
    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub secret: SecretConfig,
    #[serde(default)]
    pub slug: SlugConfig,
}

impl AppConfig {
    /// Create a test configuration rooted at `store_path`.
    ///
    /// **For testing only.** The background sweep is disabled and metrics are on.
    pub fn for_testing(store_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1".to_string(),
                port: 0,
                metrics_enabled: true,
                ..ServerConfig::default()
            },
            store: StoreConfig {
                path: store_path.into(),
                ..StoreConfig::default()
            },
            sweep: SweepConfig {
                enabled: false,
                ..SweepConfig::default()
            },
            secret: SecretConfig::default(),
            slug: SlugConfig::default(),
        }
    }

    /// Validate every section, reporting the first failure.
    pub fn validate(&self) -> crate::Result<()> {
        self.server
            .validate()
            .and_then(|_| self.store.validate())
            .and_then(|_| self.sweep.validate())
            .and_then(|_| self.secret.validate())
            .and_then(|_| self.slug.validate())
            .map_err(crate::Error::InvalidConfig)
    }
}
