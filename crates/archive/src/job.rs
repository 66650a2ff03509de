//! Observable zip export job: add, compress, deliver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reelcut_common::blob::Blob;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::media::MediaItem;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::manager::{ZipExportOptions, ZipManager};

/// Share of the progress bar spent adding files.
const ADDING_SPAN: f64 = 40.0;
const COMPRESSING_PROGRESS: u8 = 60;
const DOWNLOADING_PROGRESS: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZipPhase {
    #[default]
    Idle,
    Adding,
    Compressing,
    Downloading,
    Complete,
    Error,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipExportProgress {
    pub phase: ZipPhase,
    /// 0..=100.
    pub progress: u8,
    pub total_files: usize,
    pub completed_files: usize,
    pub error: Option<String>,
}

/// Destination for a finished archive.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Persist `blob` under `filename`, returning where it went.
    async fn save(&self, blob: Blob, filename: &str) -> ReelcutResult<PathBuf>;
}

/// Writes archives into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArchiveSink for DirectorySink {
    async fn save(&self, blob: Blob, filename: &str) -> ReelcutResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &blob.data).await?;
        tracing::info!(path = %path.display(), bytes = blob.len(), "Archive saved");
        Ok(path)
    }
}

/// Runs one archive export at a time and publishes its progress.
pub struct ZipExportJob {
    options: ZipExportOptions,
    progress: Arc<watch::Sender<ZipExportProgress>>,
}

impl ZipExportJob {
    pub fn new(options: ZipExportOptions) -> Self {
        let (tx, _rx) = watch::channel(ZipExportProgress::default());
        Self {
            options,
            progress: Arc::new(tx),
        }
    }

    pub fn options(&self) -> &ZipExportOptions {
        &self.options
    }

    pub fn subscribe(&self) -> watch::Receiver<ZipExportProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> ZipExportProgress {
        self.progress.borrow().clone()
    }

    /// Archive `items` and hand the result to `sink`.
    ///
    /// Returns `Ok(None)` without touching progress when there is nothing to
    /// archive.
    pub async fn run(
        &self,
        items: Vec<MediaItem>,
        root: Option<PathBuf>,
        sink: &dyn ArchiveSink,
    ) -> ReelcutResult<Option<PathBuf>> {
        if items.is_empty() {
            tracing::debug!("No media to archive");
            return Ok(None);
        }

        match self.run_inner(items, root, sink).await {
            Ok(path) => Ok(Some(path)),
            Err(err) => {
                tracing::error!(error = %err, "Archive export failed");
                let message = err.user_message();
                self.progress.send_modify(|p| {
                    p.phase = ZipPhase::Error;
                    p.error = Some(message);
                });
                Err(err)
            }
        }
    }

    async fn run_inner(
        &self,
        items: Vec<MediaItem>,
        root: Option<PathBuf>,
        sink: &dyn ArchiveSink,
    ) -> ReelcutResult<PathBuf> {
        let total = items.len();
        self.progress.send_replace(ZipExportProgress {
            phase: ZipPhase::Adding,
            progress: 0,
            total_files: total,
            completed_files: 0,
            error: None,
        });

        let progress = Arc::clone(&self.progress);
        let (manager, added) = tokio::task::spawn_blocking(move || {
            let mut zip = ZipManager::new();
            let added = zip.add_media_items(&items, root.as_deref(), |fraction| {
                progress.send_modify(|p| {
                    p.progress = (fraction * ADDING_SPAN).round() as u8;
                    p.completed_files = (fraction * total as f64).round() as usize;
                });
            });
            (zip, added)
        })
        .await
        .map_err(|e| ReelcutError::archive(format!("add task failed: {e}")))?;

        tracing::info!(added, total, "Media added to archive");

        self.progress.send_modify(|p| {
            p.phase = ZipPhase::Compressing;
            p.progress = COMPRESSING_PROGRESS;
        });

        let options = self.options.clone();
        let blob = tokio::task::spawn_blocking(move || manager.generate_zip(&options))
            .await
            .map_err(|e| ReelcutError::archive(format!("compress task failed: {e}")))??;

        self.progress.send_modify(|p| {
            p.phase = ZipPhase::Downloading;
            p.progress = DOWNLOADING_PROGRESS;
        });

        let path = sink.save(blob, &self.options.archive_name()).await?;

        self.progress.send_modify(|p| {
            p.phase = ZipPhase::Complete;
            p.progress = 100;
        });
        Ok(path)
    }
}

impl Default for ZipExportJob {
    fn default() -> Self {
        Self::new(ZipExportOptions::default())
    }
}
