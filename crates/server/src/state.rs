//! Application state shared across handlers.

use std::sync::Arc;
use txtpages_core::StockPages;
use txtpages_core::config::AppConfig;
use txtpages_store::PageStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Page store.
    pub store: Arc<dyn PageStore>,
    /// Stock pages bundled with the server; these shadow stored slugs.
    pub stock: Arc<StockPages>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, store: Arc<dyn PageStore>, stock: StockPages) -> Self {
        Self {
            config: Arc::new(config),
            store,
            stock: Arc::new(stock),
        }
    }

    /// Site name used in page titles and metadata.
    pub fn site_name(&self) -> &str {
        &self.config.server.site_name
    }
}
