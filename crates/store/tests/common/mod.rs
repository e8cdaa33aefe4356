//! Common test utilities for the page store.

use std::sync::Arc;
use tempfile::TempDir;
use txtpages_core::config::StoreConfig;
use txtpages_core::{ReservedSlugs, SlugStyle, Timestamp};
use txtpages_store::{PageStore, SqliteStore, StoreResult};

/// Secret of the seed page in every test store.
pub const SEED_SECRET: &str = "seed-secret-words";

/// A test page store that cleans up its directory on drop.
#[allow(dead_code)]
pub struct TestStore {
    pub store: Arc<SqliteStore>,
    pub config: StoreConfig,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStore {
    /// A freshly initialized store holding only the seed page.
    pub async fn new() -> StoreResult<Self> {
        Self::with(ReservedSlugs::new(), SlugStyle::Underscore).await
    }

    /// A store that refuses the given reserved slugs.
    pub async fn with(reserved: ReservedSlugs, style: SlugStyle) -> StoreResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = StoreConfig {
            path: temp_dir.path().join("pages.db"),
            ..StoreConfig::default()
        };
        let store = SqliteStore::initialize(&config, SEED_SECRET)
            .await?
            .with_reserved(reserved)
            .with_slug_style(style);

        Ok(Self {
            store: Arc::new(store),
            config,
            _temp_dir: temp_dir,
        })
    }

    /// The store as the trait object the server uses.
    pub fn store(&self) -> Arc<dyn PageStore> {
        self.store.clone()
    }

    /// Read a page's raw `last_read_at` column.
    pub async fn raw_last_read_at(&self, slug: &str) -> String {
        sqlx::query_scalar("SELECT last_read_at FROM pages WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.store.pool())
            .await
            .expect("page should exist")
    }

    /// Force a page's timestamps, bypassing the store API.
    pub async fn set_timestamps(&self, slug: &str, created_at: Timestamp, last_read_at: Timestamp) {
        sqlx::query("UPDATE pages SET created_at = ?, last_read_at = ? WHERE slug = ?")
            .bind(created_at.to_iso8601())
            .bind(last_read_at.to_iso8601())
            .bind(slug)
            .execute(self.store.pool())
            .await
            .expect("update timestamps");
    }
}

/// A timestamp `days` days before now.
#[allow(dead_code)]
pub fn days_ago(days: i64) -> Timestamp {
    Timestamp::now()
        .checked_sub(time::Duration::days(days))
        .expect("in range")
}
