//! Page store for txtpages.
//!
//! This crate owns every persisted page record:
//! - Slug assignment, uniqueness and reserved slugs
//! - Edit authorization through the page secret
//! - Read tracking and expiry purges

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::{PageRow, PurgedPage};
pub use repos::{ExpiryRepo, PageRepo};
pub use store::{PageStore, SEED_SLUG, SqliteStore};

use std::sync::Arc;
use txtpages_core::ReservedSlugs;
use txtpages_core::config::AppConfig;

/// Open the configured store, applying slug and secret settings.
pub async fn from_config(
    config: &AppConfig,
    reserved: ReservedSlugs,
) -> StoreResult<Arc<dyn PageStore>> {
    let store = SqliteStore::open(&config.store)
        .await?
        .with_slug_style(config.slug.style)
        .with_secret_words(config.secret.words)
        .with_reserved(reserved);
    Ok(Arc::new(store) as Arc<dyn PageStore>)
}
