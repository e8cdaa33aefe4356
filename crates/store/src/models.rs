//! Database models mapping to the page store schema.

use crate::error::{StoreError, StoreResult};
use sqlx::FromRow;
use txtpages_core::{Page, Timestamp};

/// A row of the `pages` table as stored.
///
/// Timestamps are kept as their ISO-8601 text until converted into a [`Page`].
#[derive(Clone, FromRow)]
pub struct PageRow {
    pub page_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub secret: String,
    pub description: String,
    pub author: String,
    pub created_at: String,
    pub last_read_at: String,
}

impl TryFrom<PageRow> for Page {
    type Error = StoreError;

    fn try_from(row: PageRow) -> StoreResult<Self> {
        Ok(Page {
            id: row.page_id,
            created_at: parse_stored(&row.created_at, row.page_id)?,
            last_read_at: parse_stored(&row.last_read_at, row.page_id)?,
            title: row.title,
            slug: row.slug,
            content: row.content,
            secret: row.secret,
            description: row.description,
            author: row.author,
        })
    }
}

/// A page removed by an expiry purge, kept for audit logging.
///
/// `last_read_at` is the column text as stored. It is not parsed, so a row
/// that is already deleted can always be reported.
#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct PurgedPage {
    pub page_id: i64,
    pub title: String,
    pub slug: String,
    pub last_read_at: String,
}

impl PurgedPage {
    /// The parsed read time, or `None` when the stored text is not a timestamp.
    pub fn read_at(&self) -> Option<Timestamp> {
        Timestamp::parse(&self.last_read_at).ok()
    }
}

fn parse_stored(value: &str, page_id: i64) -> StoreResult<Timestamp> {
    Timestamp::parse(value).map_err(|e| {
        StoreError::Internal(format!("page {page_id} has a corrupt timestamp: {e}"))
    })
}
