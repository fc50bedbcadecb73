//! Posewatch Common Utilities
//!
//! Shared infrastructure for all Posewatch crates:
//! - Error types and result aliases
//! - Run clock and per-run artifact namespaces
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
