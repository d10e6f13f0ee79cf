//! Configuration model for tagsmith.
//!
//! This module defines the Config struct that represents `.tagsmith/config.yaml`.
//! Missing fields take defaults, unknown keys are reported as warnings, and
//! values are validated on load.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use types::{CleanupStrategy, DuplicateDispatchPolicy, RemoteConfig};
