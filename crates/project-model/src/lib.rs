//! Reelcut Project Model
//!
//! Defines the core data contracts for reelcut projects:
//! - **Timeline:** Tracks of clips with timing, trims, effects, and text
//! - **Media:** Items in the project's media store
//! - **Export:** Output format, quality presets, and filename
//! - **Project:** On-disk bundle with metadata and the timeline
//!
//! Times are in seconds; positions are in canvas pixels.

pub mod export;
pub mod media;
pub mod project;
pub mod timeline;

pub use export::*;
pub use media::*;
pub use project::*;
pub use timeline::*;
