//! HTTP request handlers.

pub mod pages;

pub use pages::*;
