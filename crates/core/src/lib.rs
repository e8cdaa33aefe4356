//! Core domain types for txtpages.
//!
//! This crate defines the pieces every other crate agrees on:
//! - Slug normalization and synthesized slugs
//! - Pass-phrase secrets for editing pages
//! - Page inputs and the page record itself
//! - Stock pages loaded from disk
//! - Configuration shared by the store and the server

pub mod config;
pub mod error;
pub mod page;
pub mod passphrase;
pub mod slug;
pub mod stock;
pub mod timestamp;

pub use error::{Error, Result};
pub use page::{NewPage, Page, PageEdit};
pub use passphrase::generate_passphrase;
pub use slug::{ReservedSlugs, SlugStyle};
pub use stock::{StockPage, StockPages};
pub use timestamp::Timestamp;

/// Maximum number of characters kept in a derived page description.
pub const DESCRIPTION_MAX_CHARS: usize = 160;
