//! Page store error types.

use thiserror::Error;

/// Page store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or an argument is out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// The slug is already taken by a stored page or reserved.
    #[error("slug already exists: {0}")]
    SlugExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The supplied edit secret does not match the page.
    #[error("incorrect edit secret")]
    WrongSecret,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<txtpages_core::Error> for StoreError {
    fn from(err: txtpages_core::Error) -> Self {
        match err {
            txtpages_core::Error::Validation(msg) => Self::Validation(msg),
            txtpages_core::Error::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result type for page store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which column a SQLite UNIQUE violation was raised for, if any.
///
/// SQLite reports these as "UNIQUE constraint failed: pages.slug".
pub(crate) fn unique_violation_column(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let msg = db_err.message();
    if !msg.contains("UNIQUE constraint") {
        return None;
    }
    if msg.contains("pages.slug") {
        Some("slug")
    } else if msg.contains("pages.page_id") {
        Some("page_id")
    } else {
        Some("unknown")
    }
}
