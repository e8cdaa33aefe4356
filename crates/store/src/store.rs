//! Page store trait and the SQLite implementation.

use crate::error::{StoreError, StoreResult};
use crate::repos::{ExpiryRepo, PageRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;
use txtpages_core::config::StoreConfig;
use txtpages_core::passphrase::DEFAULT_WORD_COUNT;
use txtpages_core::{ReservedSlugs, SlugStyle, Timestamp};

/// Slug of the page written when a store is initialized.
pub const SEED_SLUG: &str = "firstpost";
const SEED_TITLE: &str = "First Post!";
const SEED_CONTENT: &str = "This is the first post.";

/// Upper bound on slug attempts before giving up on a create or edit.
const MAX_SLUG_ATTEMPTS: u32 = 16;

/// Combined page store trait.
#[async_trait]
pub trait PageStore: PageRepo + ExpiryRepo + Send + Sync {
    /// Bring an existing schema up to date.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// SQLite-based page store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    reserved: ReservedSlugs,
    slug_style: SlugStyle,
    secret_words: usize,
}

impl SqliteStore {
    /// Create a new store file with the schema and the seed page.
    ///
    /// Fails if `config.path` already exists. Table creation and the seed
    /// insert run in one transaction; on any failure the file is removed.
    pub async fn initialize(config: &StoreConfig, seed_secret: &str) -> StoreResult<Self> {
        let path = config.path.as_path();
        if path.exists() {
            return Err(StoreError::Config(format!(
                "{} already exists, refusing to initialize over it",
                path.display()
            )));
        }

        let pool = match connect(path, config.busy_timeout(), true).await {
            Ok(pool) => pool,
            Err(e) => {
                remove_store_files(path);
                return Err(e);
            }
        };

        if let Err(e) = create_schema(&pool, seed_secret).await {
            pool.close().await;
            remove_store_files(path);
            return Err(e);
        }

        tracing::info!(path = %path.display(), "Initialized page store");
        Ok(Self::from_pool(pool))
    }

    /// Open an existing store file.
    ///
    /// The file is never created here; it must hold a `pages` table.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.path.as_path();
        if !path.is_file() {
            return Err(StoreError::Config(format!(
                "{} does not exist, create it with -i",
                path.display()
            )));
        }

        let pool = connect(path, config.busy_timeout(), false).await?;
        let has_pages: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='pages')",
        )
        .fetch_one(&pool)
        .await?;
        if !has_pages {
            pool.close().await;
            return Err(StoreError::Config(format!(
                "{} is not a page store: missing pages table",
                path.display()
            )));
        }

        let store = Self::from_pool(pool);
        store.migrate().await?;
        tracing::info!(path = %path.display(), "Opened page store");
        Ok(store)
    }

    fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            reserved: ReservedSlugs::new(),
            slug_style: SlugStyle::default(),
            secret_words: DEFAULT_WORD_COUNT,
        }
    }

    /// Slugs no stored page may take, typically the stock pages.
    pub fn with_reserved(mut self, reserved: ReservedSlugs) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn with_slug_style(mut self, style: SlugStyle) -> Self {
        self.slug_style = style;
        self
    }

    /// Word count for generated secrets.
    pub fn with_secret_words(mut self, words: usize) -> Self {
        self.secret_words = words;
        self
    }

    pub fn reserved(&self) -> &ReservedSlugs {
        &self.reserved
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn connect(path: &Path, busy_timeout: Duration, create: bool) -> StoreResult<Pool<Sqlite>> {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // Wait on a locked database instead of failing straight away.
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        // SQLite serializes writers anyway; one connection avoids "database is locked".
        .max_connections(1)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

async fn create_schema(pool: &Pool<Sqlite>, seed_secret: &str) -> StoreResult<()> {
    let now = Timestamp::now().to_iso8601();
    let mut tx = pool.begin().await?;
    sqlx::query(SCHEMA_SQL).execute(&mut *tx).await?;
    sqlx::query(
        "INSERT INTO pages (title, slug, content, secret, created_at, last_read_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(SEED_TITLE)
    .bind(SEED_SLUG)
    .bind(SEED_CONTENT)
    .bind(seed_secret)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

fn remove_store_files(path: &Path) {
    let mut candidates = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        candidates.push(PathBuf::from(name));
    }
    for file in candidates {
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "Failed to remove store file"),
        }
    }
}

#[async_trait]
impl PageStore for SqliteStore {
    async fn migrate(&self) -> StoreResult<()> {
        // Stores created before description/author existed lack those columns.
        // SQLite has no ADD COLUMN IF NOT EXISTS, so check first.
        let columns: Vec<(i32, String, String, i32, Option<String>, i32)> =
            sqlx::query_as("PRAGMA table_info(pages)")
                .fetch_all(&self.pool)
                .await?;

        for column in ["description", "author"] {
            let present = columns.iter().any(|(_, name, _, _, _, _)| name == column);
            if !present {
                tracing::info!(column, "Adding missing column to pages table");
                sqlx::query(&format!(
                    "ALTER TABLE pages ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"
                ))
                .execute(&self.pool)
                .await?;
            }
        }

        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::error::unique_violation_column;
    use crate::models::{PageRow, PurgedPage};
    use txtpages_core::page::validate_required;
    use txtpages_core::slug::{auto_slug, sanitize};
    use txtpages_core::{NewPage, Page, PageEdit, generate_passphrase};

    /// Column values for an insert, everything except id and slug.
    struct InsertFields<'a> {
        title: &'a str,
        content: &'a str,
        secret: String,
        description: &'a str,
        author: &'a str,
        created_at: String,
        last_read_at: String,
    }

    async fn insert_page<'e, E>(
        executor: E,
        page_id: Option<i64>,
        slug: &str,
        fields: &InsertFields<'_>,
    ) -> Result<PageRow, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PageRow>(
            "INSERT INTO pages (page_id, title, slug, content, secret, description, author, created_at, last_read_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(page_id)
        .bind(fields.title)
        .bind(slug)
        .bind(fields.content)
        .bind(&fields.secret)
        .bind(fields.description)
        .bind(fields.author)
        .bind(&fields.created_at)
        .bind(&fields.last_read_at)
        .fetch_one(executor)
        .await
    }

    impl SqliteStore {
        fn sanitize(&self, input: &str) -> String {
            sanitize(input, self.slug_style)
        }

        /// Requested slug after sanitizing, `None` when it should be synthesized.
        fn requested_slug(&self, slug: Option<&str>) -> Option<String> {
            slug.map(|s| self.sanitize(s)).filter(|s| !s.is_empty())
        }

        fn ensure_not_reserved(&self, slug: &str) -> StoreResult<()> {
            if self.reserved.contains(slug) {
                return Err(StoreError::SlugExists(slug.to_string()));
            }
            Ok(())
        }

        async fn insert_with_slug(&self, slug: &str, fields: &InsertFields<'_>) -> StoreResult<PageRow> {
            self.ensure_not_reserved(slug)?;
            match insert_page(&self.pool, None, slug, fields).await {
                Ok(row) => Ok(row),
                Err(e) if unique_violation_column(&e) == Some("slug") => {
                    Err(StoreError::SlugExists(slug.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        }

        /// Insert under `{base}{id}`, computing the id in the same transaction.
        ///
        /// A UNIQUE violation on the slug retries with the next attempt suffix;
        /// one on the id means another writer took it, so retry as is.
        async fn insert_with_auto_slug(&self, base: &str, fields: &InsertFields<'_>) -> StoreResult<PageRow> {
            let mut attempt = 0;
            for _ in 0..MAX_SLUG_ATTEMPTS {
                let mut tx = self.pool.begin().await?;
                let next_id: i64 =
                    sqlx::query_scalar("SELECT IFNULL(MAX(page_id), 0) + 1 FROM pages")
                        .fetch_one(&mut *tx)
                        .await?;
                let slug = auto_slug(base, next_id, attempt, self.slug_style);
                if self.reserved.contains(&slug) {
                    attempt += 1;
                    continue;
                }

                match insert_page(&mut *tx, Some(next_id), &slug, fields).await {
                    Ok(row) => {
                        tx.commit().await?;
                        return Ok(row);
                    }
                    Err(e) => match unique_violation_column(&e) {
                        Some("slug") => {
                            tracing::debug!(slug = %slug, attempt, "Synthesized slug taken, retrying");
                            attempt += 1;
                        }
                        Some("page_id") => {
                            tracing::debug!(page_id = next_id, "Page id taken concurrently, retrying");
                        }
                        _ => return Err(e.into()),
                    },
                }
            }

            Err(StoreError::Internal(format!(
                "no free slug for base '{base}' after {MAX_SLUG_ATTEMPTS} attempts"
            )))
        }

        async fn update_page_row(
            &self,
            page_id: i64,
            slug: &str,
            edit: &PageEdit,
            secret: &str,
            now: &str,
        ) -> Result<Option<PageRow>, sqlx::Error> {
            sqlx::query_as::<_, PageRow>(
                "UPDATE pages SET title = ?, slug = ?, content = ?, description = ?, author = ?, \
                 last_read_at = MAX(?, created_at) \
                 WHERE page_id = ? AND secret = ? RETURNING *",
            )
            .bind(&edit.title)
            .bind(slug)
            .bind(&edit.content)
            .bind(&edit.description)
            .bind(&edit.author)
            .bind(now)
            .bind(page_id)
            .bind(secret)
            .fetch_optional(&self.pool)
            .await
        }
    }

    #[async_trait]
    impl PageRepo for SqliteStore {
        async fn create_page(&self, page: &NewPage) -> StoreResult<Page> {
            validate_required(&page.title, &page.content)?;

            let created_at = page.created_at.unwrap_or_else(Timestamp::now);
            let last_read_at = page.last_read_at.unwrap_or(created_at).max(created_at);
            let secret = page
                .secret
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| generate_passphrase(self.secret_words));

            let fields = InsertFields {
                title: &page.title,
                content: &page.content,
                secret,
                description: &page.description,
                author: &page.author,
                created_at: created_at.to_iso8601(),
                last_read_at: last_read_at.to_iso8601(),
            };

            let row = match self.requested_slug(page.slug.as_deref()) {
                Some(slug) => self.insert_with_slug(&slug, &fields).await?,
                None => {
                    let base = self.sanitize(&page.title);
                    self.insert_with_auto_slug(&base, &fields).await?
                }
            };

            let created = Page::try_from(row)?;
            tracing::info!(page_id = created.id, slug = %created.slug, "Page created");
            Ok(created)
        }

        async fn get_page(&self, page_id: i64) -> StoreResult<Option<Page>> {
            let row = sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE page_id = ?")
                .bind(page_id)
                .fetch_optional(&self.pool)
                .await?;
            row.map(Page::try_from).transpose()
        }

        async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
            let row = sqlx::query_as::<_, PageRow>("SELECT * FROM pages WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
            row.map(Page::try_from).transpose()
        }

        async fn edit_page(&self, page_id: i64, edit: &PageEdit, secret: &str) -> StoreResult<Page> {
            let current = self.find_page(page_id).await?;
            if current.secret != secret {
                tracing::warn!(page_id, "Edit rejected: wrong secret");
                return Err(StoreError::WrongSecret);
            }
            validate_required(&edit.title, &edit.content)?;

            let now = Timestamp::now().to_iso8601();
            let row = match self.requested_slug(edit.slug.as_deref()) {
                Some(slug) => {
                    self.ensure_not_reserved(&slug)?;
                    match self.update_page_row(page_id, &slug, edit, secret, &now).await {
                        Ok(row) => row,
                        Err(e) if unique_violation_column(&e) == Some("slug") => {
                            return Err(StoreError::SlugExists(slug));
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                None => {
                    let base = self.sanitize(&edit.title);
                    let mut updated = None;
                    for attempt in 0..MAX_SLUG_ATTEMPTS {
                        let slug = auto_slug(&base, page_id, attempt, self.slug_style);
                        if self.reserved.contains(&slug) {
                            continue;
                        }
                        match self.update_page_row(page_id, &slug, edit, secret, &now).await {
                            Ok(row) => {
                                updated = Some(row);
                                break;
                            }
                            Err(e) if unique_violation_column(&e) == Some("slug") => continue,
                            Err(e) => return Err(e.into()),
                        }
                    }
                    updated.ok_or_else(|| {
                        StoreError::Internal(format!(
                            "no free slug for page {page_id} after {MAX_SLUG_ATTEMPTS} attempts"
                        ))
                    })?
                }
            };

            // The row vanished between the secret check and the update.
            let row = row.ok_or_else(|| StoreError::NotFound(format!("page {page_id}")))?;
            let page = Page::try_from(row)?;
            tracing::info!(page_id, slug = %page.slug, "Page edited");
            Ok(page)
        }

        async fn touch_page(&self, slug: &str) -> StoreResult<bool> {
            let result =
                sqlx::query("UPDATE pages SET last_read_at = MAX(?, created_at) WHERE slug = ?")
                    .bind(Timestamp::now().to_iso8601())
                    .bind(slug)
                    .execute(&self.pool)
                    .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn delete_page(&self, page_id: i64) -> StoreResult<bool> {
            let result = sqlx::query("DELETE FROM pages WHERE page_id = ?")
                .bind(page_id)
                .execute(&self.pool)
                .await?;
            let deleted = result.rows_affected() > 0;
            if deleted {
                tracing::info!(page_id, "Page deleted");
            }
            Ok(deleted)
        }

        async fn count_pages(&self) -> StoreResult<i64> {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
                .fetch_one(&self.pool)
                .await?;
            Ok(count)
        }
    }

    #[async_trait]
    impl ExpiryRepo for SqliteStore {
        async fn purge_read_before(&self, cutoff: Timestamp) -> StoreResult<Vec<PurgedPage>> {
            // Fixed-width ISO text compares in time order.
            let mut purged = sqlx::query_as::<_, PurgedPage>(
                "DELETE FROM pages WHERE last_read_at < ? RETURNING page_id, title, slug, last_read_at",
            )
            .bind(cutoff.to_iso8601())
            .fetch_all(&self.pool)
            .await?;

            for page in purged.iter().filter(|p| p.read_at().is_none()) {
                tracing::warn!(
                    page_id = page.page_id,
                    last_read_at = %page.last_read_at,
                    "Purged page had an unparseable last_read_at"
                );
            }
            purged.sort_by_key(|p| p.page_id);
            Ok(purged)
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    page_id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL DEFAULT '',
    secret TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    author TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    last_read_at TEXT NOT NULL,
    CHECK (last_read_at >= created_at)
);
CREATE INDEX IF NOT EXISTS idx_pages_last_read_at ON pages(last_read_at);
"#;
