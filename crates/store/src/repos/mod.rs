//! Repository traits for page store operations.

pub mod expiry;
pub mod pages;

pub use expiry::ExpiryRepo;
pub use pages::PageRepo;
