//! Page repository trait.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use txtpages_core::{NewPage, Page, PageEdit};

/// Repository for creating, reading and editing pages.
#[async_trait]
pub trait PageRepo: Send + Sync {
    /// Create a page, assigning its id, final slug and secret.
    ///
    /// An explicit slug that is taken or reserved fails with
    /// [`StoreError::SlugExists`] and leaves the store unchanged.
    async fn create_page(&self, page: &NewPage) -> StoreResult<Page>;

    /// Get a page by id.
    async fn get_page(&self, page_id: i64) -> StoreResult<Option<Page>>;

    /// Get a page by slug.
    async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>>;

    /// Replace a page's fields after checking `secret`.
    ///
    /// The secret is checked before anything else. `last_read_at` is set to now.
    async fn edit_page(&self, page_id: i64, edit: &PageEdit, secret: &str) -> StoreResult<Page>;

    /// Record a read. Returns false when no page has this slug.
    async fn touch_page(&self, slug: &str) -> StoreResult<bool>;

    /// Delete a page outright. Returns false when it did not exist.
    async fn delete_page(&self, page_id: i64) -> StoreResult<bool>;

    /// Number of stored pages.
    async fn count_pages(&self) -> StoreResult<i64>;

    /// Like [`get_page`](Self::get_page), but a missing page is an error.
    async fn find_page(&self, page_id: i64) -> StoreResult<Page> {
        self.get_page(page_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("page {page_id}")))
    }

    /// Like [`get_page_by_slug`](Self::get_page_by_slug), but a missing page is an error.
    async fn find_page_by_slug(&self, slug: &str) -> StoreResult<Page> {
        self.get_page_by_slug(slug)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("page '{slug}'")))
    }
}
