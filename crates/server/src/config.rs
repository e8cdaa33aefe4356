//! Configuration loading.
//!
//! Values are layered: compiled defaults, then the TOML file when it exists,
//! then `TXTPAGES_*` environment variables (`__` separates nested keys, e.g.
//! `TXTPAGES_SWEEP__RETENTION_DAYS=30`).

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::Path;
use txtpages_core::config::AppConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TXTPAGES_CONFIG";

/// Config file used when `TXTPAGES_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "txtpages.toml";

/// Build the layered configuration source.
pub fn figment(file: &Path) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if file.exists() {
        tracing::info!(config_path = %file.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(file));
    } else {
        tracing::debug!("No config file found at {}", file.display());
    }
    figment.merge(Env::prefixed("TXTPAGES_").ignore(&["CONFIG"]).split("__"))
}

/// Load configuration from `file` and the environment.
pub fn load_config(file: &Path) -> Result<AppConfig, figment::Error> {
    figment(file).extract()
}
