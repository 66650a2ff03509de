//! Reelcut Archive
//!
//! Bundles a project's media into a single zip file. [`ZipManager`] does the
//! synchronous naming and packing; [`ZipExportJob`] runs it off the async
//! runtime and publishes phase progress.

pub mod job;
pub mod manager;

pub use job::{ArchiveSink, DirectorySink, ZipExportJob, ZipExportProgress, ZipPhase};
pub use manager::{
    entry_name_for, sanitize_for_windows, Compression, ZipExportOptions, ZipManager,
    ARCHIVE_COMMENT, ZIP_MIME_TYPE,
};
