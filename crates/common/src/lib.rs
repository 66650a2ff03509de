//! Reelcut Common Utilities
//!
//! Shared infrastructure for all reelcut crates:
//! - Error types and result aliases
//! - Frame timing used for export progress estimates
//! - Binary blob type for finished artifacts
//! - Tracing/logging initialization
//! - Configuration loading

pub mod blob;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use blob::*;
pub use clock::*;
pub use config::*;
pub use error::*;
