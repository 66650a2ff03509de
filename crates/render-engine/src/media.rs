//! Decoded media access for scene building.
//!
//! The renderer never touches files. Scene building asks a [`MediaSource`]
//! for the pixels of a media item at a source timestamp; any failure turns
//! the element into an empty node for that frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use reelcut_common::error::ReelcutError;
use reelcut_project_model::media::{MediaItem, MediaKind};

/// Cached video frames kept before the cache is flushed.
const DEFAULT_CACHE_LIMIT: usize = 256;

/// Errors produced while fetching decoded media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unknown media '{0}'")]
    Unknown(String),

    #[error("media '{id}' is not visual")]
    NotVisual { id: String },

    #[error("failed to decode media '{id}': {reason}")]
    Decode { id: String, reason: String },

    #[error("I/O error reading media '{id}': {source}")]
    Io {
        id: String,
        source: std::io::Error,
    },
}

impl From<MediaError> for ReelcutError {
    fn from(err: MediaError) -> Self {
        ReelcutError::render(err.to_string())
    }
}

/// Read-only access to decoded media frames.
pub trait MediaSource: Send + Sync {
    /// Pixels of `media_id` at `source_time_secs` into the media.
    fn frame_at(&self, media_id: &str, source_time_secs: f64) -> Result<Arc<RgbaImage>, MediaError>;
}

/// A source with no media; every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyMediaSource;

impl MediaSource for EmptyMediaSource {
    fn frame_at(&self, media_id: &str, _source_time_secs: f64) -> Result<Arc<RgbaImage>, MediaError> {
        Err(MediaError::Unknown(media_id.to_string()))
    }
}

/// Project media decoded for export.
///
/// Stills are decoded once up front. Video frames are pulled on demand
/// through the ffmpeg CLI and cached by `(media, millisecond)`.
#[derive(Debug)]
pub struct MediaLibrary {
    stills: HashMap<String, Arc<RgbaImage>>,
    videos: HashMap<String, PathBuf>,
    broken: HashMap<String, String>,
    non_visual: Vec<String>,
    ffmpeg_binary: String,
    cache: Mutex<HashMap<(String, u64), Arc<RgbaImage>>>,
    cache_limit: usize,
}

impl MediaLibrary {
    pub fn new(ffmpeg_binary: impl Into<String>) -> Self {
        Self {
            stills: HashMap::new(),
            videos: HashMap::new(),
            broken: HashMap::new(),
            non_visual: Vec::new(),
            ffmpeg_binary: ffmpeg_binary.into(),
            cache: Mutex::new(HashMap::new()),
            cache_limit: DEFAULT_CACHE_LIMIT,
        }
    }

    /// Load a project's media list. Items that cannot be read are recorded
    /// and reported on lookup rather than failing the whole load.
    pub fn from_items(items: &[MediaItem], root: Option<&Path>, ffmpeg_binary: impl Into<String>) -> Self {
        let mut library = Self::new(ffmpeg_binary);
        for item in items {
            match item.kind {
                MediaKind::Image => match item.read_bytes(root) {
                    Ok(Some(bytes)) => {
                        if let Err(err) = library.insert_still_bytes(&item.id, &bytes) {
                            tracing::warn!(media = %item.id, error = %err, "Failed to decode image");
                            library.broken.insert(item.id.clone(), err.to_string());
                        }
                    }
                    Ok(None) => {
                        library
                            .broken
                            .insert(item.id.clone(), "no data or path".to_string());
                    }
                    Err(err) => {
                        tracing::warn!(media = %item.id, error = %err, "Failed to read image");
                        library.broken.insert(item.id.clone(), err.to_string());
                    }
                },
                MediaKind::Video => match item.resolved_path(root) {
                    Some(path) => library.insert_video(&item.id, path),
                    None => {
                        tracing::warn!(media = %item.id, "Video item has no path; it will render empty");
                        library
                            .broken
                            .insert(item.id.clone(), "video has no file path".to_string());
                    }
                },
                MediaKind::Audio => library.non_visual.push(item.id.clone()),
            }
        }
        tracing::debug!(
            stills = library.stills.len(),
            videos = library.videos.len(),
            broken = library.broken.len(),
            "Media library loaded"
        );
        library
    }

    pub fn insert_still(&mut self, id: impl Into<String>, image: RgbaImage) {
        self.stills.insert(id.into(), Arc::new(image));
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) and register them.
    pub fn insert_still_bytes(&mut self, id: &str, bytes: &[u8]) -> Result<(), MediaError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| MediaError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.insert_still(id, decoded.to_rgba8());
        Ok(())
    }

    pub fn insert_video(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.videos.insert(id.into(), path.into());
    }

    pub fn with_cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.stills.len() + self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn decode_video_frame(&self, id: &str, path: &Path, time_secs: f64) -> Result<RgbaImage, MediaError> {
        let output = Command::new(&self.ffmpeg_binary)
            .args(["-v", "error", "-ss"])
            .arg(format!("{time_secs:.3}"))
            .arg("-i")
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::Io {
                id: id.to_string(),
                source: e,
            })?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(MediaError::Decode {
                id: id.to_string(),
                reason: format!(
                    "ffmpeg produced no frame at {time_secs:.3}s: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        image::load_from_memory(&output.stdout)
            .map(|img| img.to_rgba8())
            .map_err(|e| MediaError::Decode {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

impl MediaSource for MediaLibrary {
    fn frame_at(&self, media_id: &str, source_time_secs: f64) -> Result<Arc<RgbaImage>, MediaError> {
        if let Some(still) = self.stills.get(media_id) {
            return Ok(Arc::clone(still));
        }
        if let Some(reason) = self.broken.get(media_id) {
            return Err(MediaError::Decode {
                id: media_id.to_string(),
                reason: reason.clone(),
            });
        }
        if self.non_visual.iter().any(|id| id == media_id) {
            return Err(MediaError::NotVisual {
                id: media_id.to_string(),
            });
        }
        let Some(path) = self.videos.get(media_id) else {
            return Err(MediaError::Unknown(media_id.to_string()));
        };

        let key = (media_id.to_string(), (source_time_secs.max(0.0) * 1000.0).round() as u64);
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Ok(Arc::clone(hit));
            }
        }

        let frame = Arc::new(self.decode_video_frame(media_id, path, source_time_secs)?);
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= self.cache_limit {
                cache.clear();
            }
            cache.insert(key, Arc::clone(&frame));
        }
        Ok(frame)
    }
}
