//! HTTP front end for txtpages.
//!
//! This crate provides:
//! - Create, view and edit routes for Markdown pages
//! - Stock pages that shadow stored slugs
//! - The background expiry sweeper
//! - Layered configuration loading and Prometheus metrics

pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod render;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use error::{PageError, PageResult};
pub use routes::create_router;
pub use state::AppState;
pub use sweeper::{ExpirySweeper, SweepOutcome};
