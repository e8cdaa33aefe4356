//! A store wrapper whose writes can be switched to fail.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use txtpages_core::{NewPage, Page, PageEdit, Timestamp};
use txtpages_store::{
    ExpiryRepo, PageRepo, PageStore, PurgedPage, StoreError, StoreResult,
};

/// Delegates to a real store, failing purges or touches while the
/// matching flag is set.
#[allow(dead_code)]
pub struct FlakyStore {
    inner: Arc<dyn PageStore>,
    pub fail_purge: AtomicBool,
    pub fail_touch: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: Arc<dyn PageStore>) -> Self {
        Self {
            inner,
            fail_purge: AtomicBool::new(false),
            fail_touch: AtomicBool::new(false),
        }
    }

    pub fn set_fail_purge(&self, fail: bool) {
        self.fail_purge.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_touch(&self, fail: bool) {
        self.fail_touch.store(fail, Ordering::SeqCst);
    }
}

fn unavailable() -> StoreError {
    StoreError::Internal("database is locked".to_string())
}

#[async_trait]
impl PageRepo for FlakyStore {
    async fn create_page(&self, page: &NewPage) -> StoreResult<Page> {
        self.inner.create_page(page).await
    }

    async fn get_page(&self, page_id: i64) -> StoreResult<Option<Page>> {
        self.inner.get_page(page_id).await
    }

    async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
        self.inner.get_page_by_slug(slug).await
    }

    async fn edit_page(&self, page_id: i64, edit: &PageEdit, secret: &str) -> StoreResult<Page> {
        self.inner.edit_page(page_id, edit, secret).await
    }

    async fn touch_page(&self, slug: &str) -> StoreResult<bool> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.touch_page(slug).await
    }

    async fn delete_page(&self, page_id: i64) -> StoreResult<bool> {
        self.inner.delete_page(page_id).await
    }

    async fn count_pages(&self) -> StoreResult<i64> {
        self.inner.count_pages().await
    }
}

#[async_trait]
impl ExpiryRepo for FlakyStore {
    async fn purge_read_before(&self, cutoff: Timestamp) -> StoreResult<Vec<PurgedPage>> {
        if self.fail_purge.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.purge_read_before(cutoff).await
    }
}

#[async_trait]
impl PageStore for FlakyStore {
    async fn migrate(&self) -> StoreResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
}
