//! `nodesweep-handler` library crate.
//!
//! Re-exports internal modules for integration testing. The Lambda
//! entrypoint lives in `main.rs`.

pub mod cleanup;
pub mod config;
pub mod logging;

pub use cleanup::{CleanupHandler, HandlerError};
pub use config::{HandlerConfig, LogFormat};
