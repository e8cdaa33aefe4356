//! Common test utilities and fixtures.

pub mod flaky;
pub mod server;

#[allow(unused_imports)]
pub use flaky::*;
#[allow(unused_imports)]
pub use server::*;
