//! Export orchestration.
//!
//! [`ExportEngine::export_video`] validates the request, renders every
//! frame through the scene builder and renderer, feeds the recorder in
//! index order, and publishes [`ExportProgress`] snapshots on a watch
//! channel. One export runs at a time per engine.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ab_glyph::FontArc;
use reelcut_common::blob::Blob;
use reelcut_common::clock::{frame_time_secs, total_frames, FrameTimer};
use reelcut_common::config::ExportDefaults;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::export::{ExportFormat, ExportSettings};
use reelcut_project_model::timeline::{ElementKind, Timeline};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::codec::{CodecEngine, FfmpegCliEngine, VideoContainer};
use crate::media::MediaSource;
use crate::recorder::FfmpegVideoRecorder;
use crate::renderer::{SceneRenderer, Surface};
use crate::scene::SceneBuilder;
use crate::validate::{self, FileDescriptor, MemoryLevel};

/// Fonts tried when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Host facilities the engine needs, injected at construction.
pub trait ExportCapabilities: Send + Sync {
    /// A fresh, unloaded codec engine for one export.
    fn codec_engine(&self) -> Box<dyn CodecEngine>;

    /// Font for text elements; `None` renders text elements empty.
    fn font(&self) -> Option<FontArc>;

    /// Host description for logs.
    fn host_name(&self) -> &str;
}

/// Capabilities backed by the ffmpeg CLI and an optional font file.
#[derive(Clone)]
pub struct SystemCapabilities {
    ffmpeg_binary: String,
    font: Option<FontArc>,
    font_path: Option<PathBuf>,
    host: String,
}

impl std::fmt::Debug for SystemCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemCapabilities")
            .field("ffmpeg_binary", &self.ffmpeg_binary)
            .field("font_path", &self.font_path)
            .field("host", &self.host)
            .finish()
    }
}

impl SystemCapabilities {
    pub fn new(ffmpeg_binary: impl Into<String>) -> Self {
        Self {
            ffmpeg_binary: ffmpeg_binary.into(),
            font: None,
            font_path: None,
            host: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    /// Build from config, loading the configured font or the first system
    /// font found. A font that fails to load is logged and skipped.
    pub fn from_config(config: &ExportDefaults) -> Self {
        let caps = Self::new(config.ffmpeg_binary.clone());
        let path = config.font_path.clone().or_else(discover_system_font);
        match path {
            Some(path) => match caps.clone().with_font_path(&path) {
                Ok(with_font) => with_font,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to load font; text will not render");
                    caps
                }
            },
            None => {
                tracing::warn!("No font found; text elements will not render");
                caps
            }
        }
    }

    pub fn with_font_path(mut self, path: &Path) -> ReelcutResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReelcutError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ReelcutError::Io(e),
        })?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| ReelcutError::render(format!("invalid font {}: {e}", path.display())))?;
        self.font = Some(font);
        self.font_path = Some(path.to_path_buf());
        Ok(self)
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn ffmpeg_binary(&self) -> &str {
        &self.ffmpeg_binary
    }

    pub fn font_path(&self) -> Option<&Path> {
        self.font_path.as_deref()
    }
}

impl ExportCapabilities for SystemCapabilities {
    fn codec_engine(&self) -> Box<dyn CodecEngine> {
        Box::new(FfmpegCliEngine::new(self.ffmpeg_binary.clone()))
    }

    fn font(&self) -> Option<FontArc> {
        self.font.clone()
    }

    fn host_name(&self) -> &str {
        &self.host
    }
}

/// First existing font from a list of common system locations.
pub fn discover_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Export lifecycle as seen by progress subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    #[default]
    Idle,
    Preparing,
    Rendering,
    Encoding,
    Complete,
    Error,
    Cancelled,
}

impl ExportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error | Self::Cancelled)
    }
}

/// Progress snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportProgress {
    pub is_exporting: bool,
    pub state: ExportState,
    /// Percentage `[0, 100]`.
    pub progress: f64,
    pub current_frame: u64,
    pub total_frames: u64,
    /// Seconds.
    pub estimated_time_remaining: f64,
    pub status: String,
}

/// Input to [`ExportEngine::export_video`].
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub timeline: Timeline,
    pub settings: ExportSettings,
}

/// Non-fatal notes attached to a finished export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportWarning {
    /// The requested container was replaced.
    UnsupportedFormat {
        requested: ExportFormat,
        used: VideoContainer,
    },
    /// Estimated frame memory exceeded a threshold.
    HighMemory { estimated_mb: u64 },
}

/// Facts about a finished export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Sanitized text of every text element, one per line.
    pub text_content: String,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub container: VideoContainer,
    pub requested_format: ExportFormat,
    pub warnings: Vec<ExportWarning>,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub blob: Blob,
    /// Sanitized file name with the container's extension.
    pub file_name: String,
    pub metadata: ExportMetadata,
}

/// Sets the cancellation flag of a running export.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Clears the busy flag when an export finishes by any path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// End-to-end video export.
pub struct ExportEngine {
    capabilities: Arc<dyn ExportCapabilities>,
    media: Arc<dyn MediaSource>,
    busy: AtomicBool,
    cancel: Arc<AtomicBool>,
    progress: watch::Sender<ExportProgress>,
}

impl ExportEngine {
    pub fn new(capabilities: Arc<dyn ExportCapabilities>, media: Arc<dyn MediaSource>) -> Self {
        let (progress, _) = watch::channel(ExportProgress::default());
        Self {
            capabilities,
            media,
            busy: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
            progress,
        }
    }

    /// Receive progress snapshots. Only the latest snapshot is retained.
    pub fn subscribe(&self) -> watch::Receiver<ExportProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> ExportProgress {
        self.progress.borrow().clone()
    }

    pub fn is_exporting(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Request cancellation; honored at the next frame boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancel),
        }
    }

    pub fn validate_file(&self, file: &FileDescriptor) -> ReelcutResult<()> {
        validate::validate_file(file)
    }

    pub fn sanitize_file_name(&self, name: &str) -> String {
        validate::sanitize_file_name(name)
    }

    /// Render and encode `request.timeline`.
    ///
    /// Fails with `Busy` if another export is running on this engine and
    /// with `Cancelled` if [`cancel`](Self::cancel) is called before encoding
    /// starts. Every failure leaves the progress channel in a terminal state.
    pub async fn export_video(&self, request: ExportRequest) -> ReelcutResult<ExportResult> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReelcutError::Busy);
        }
        let _guard = BusyGuard(&self.busy);
        self.cancel.store(false, Ordering::SeqCst);

        let started = std::time::Instant::now();
        let result = self.run(request).await;
        match &result {
            Ok(done) => {
                tracing::info!(
                    file = %done.file_name,
                    frames = done.metadata.frame_count,
                    bytes = done.blob.len(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Export finished"
                );
            }
            Err(ReelcutError::Cancelled) => {
                tracing::info!("Export cancelled");
                self.progress.send_modify(|p| {
                    p.is_exporting = false;
                    p.state = ExportState::Cancelled;
                    p.estimated_time_remaining = 0.0;
                    p.status = ReelcutError::Cancelled.user_message();
                });
            }
            Err(err) => {
                tracing::error!(error = %err, "Export failed");
                let status = err.user_message();
                self.progress.send_modify(|p| {
                    p.is_exporting = false;
                    p.state = ExportState::Error;
                    p.estimated_time_remaining = 0.0;
                    p.status = status;
                });
            }
        }
        result
    }

    async fn run(&self, request: ExportRequest) -> ReelcutResult<ExportResult> {
        let ExportRequest { timeline, settings } = request;

        self.publish(ExportProgress {
            is_exporting: true,
            state: ExportState::Preparing,
            status: "Initializing export...".to_string(),
            ..ExportProgress::default()
        });

        validate::validate_timeline(&timeline)?;
        validate::validate_output_size(settings.width, settings.height)?;

        let fps = timeline.fps;
        let duration = timeline.duration();
        let frame_total = total_frames(duration, fps);
        let (container, coerced) = VideoContainer::resolve(settings.format);
        let file_name = validate::output_file_name(&settings.filename, container.extension());

        let mut warnings = Vec::new();
        if coerced {
            tracing::warn!(requested = %settings.format, used = %container, "Format not supported; encoding as {container}");
            warnings.push(ExportWarning::UnsupportedFormat {
                requested: settings.format,
                used: container,
            });
        }

        let memory = validate::estimate_memory_usage(settings.width, settings.height, duration, fps);
        match memory.level {
            MemoryLevel::Ok => {
                tracing::debug!(estimated_mb = memory.estimated_mb, "Estimated frame memory");
            }
            MemoryLevel::High | MemoryLevel::Critical => {
                tracing::warn!(
                    estimated_mb = memory.estimated_mb,
                    "{}",
                    memory.warning().unwrap_or_default()
                );
                warnings.push(ExportWarning::HighMemory {
                    estimated_mb: memory.estimated_mb,
                });
            }
        }

        tracing::info!(
            host = self.capabilities.host_name(),
            frames = frame_total,
            fps,
            duration_secs = duration,
            width = settings.width,
            height = settings.height,
            container = %container,
            "Starting export"
        );

        let mut recorder =
            FfmpegVideoRecorder::new(self.capabilities.codec_engine(), fps, settings.format)
                .with_output_size(settings.width, settings.height);

        if let Err(err) = recorder.start_recording().await {
            recorder.cleanup();
            return Err(err);
        }

        if let Err(err) = self.render_frames(&timeline, &settings, frame_total, &mut recorder).await {
            recorder.cleanup();
            return Err(err);
        }

        self.progress.send_modify(|p| {
            p.state = ExportState::Encoding;
            p.estimated_time_remaining = 0.0;
            p.status = "Encoding video...".to_string();
        });

        let blob = match recorder.stop_recording().await {
            Ok(blob) => blob,
            Err(err) => {
                recorder.cleanup();
                return Err(err);
            }
        };

        let metadata = ExportMetadata {
            text_content: extract_text_content(&timeline),
            frame_count: frame_total,
            duration_secs: duration,
            fps,
            width: settings.width,
            height: settings.height,
            container,
            requested_format: settings.format,
            warnings,
        };

        self.publish(ExportProgress {
            is_exporting: false,
            state: ExportState::Complete,
            progress: 100.0,
            current_frame: frame_total,
            total_frames: frame_total,
            estimated_time_remaining: 0.0,
            status: "Export complete!".to_string(),
        });

        Ok(ExportResult {
            blob,
            file_name,
            metadata,
        })
    }

    async fn render_frames(
        &self,
        timeline: &Timeline,
        settings: &ExportSettings,
        frame_total: u64,
        recorder: &mut FfmpegVideoRecorder,
    ) -> ReelcutResult<()> {
        let fps = timeline.fps;
        let renderer = SceneRenderer::new(fps);
        let font = self.capabilities.font();
        let builder = SceneBuilder::new(self.media.as_ref(), font);
        let mut surface = Surface::new(settings.width, settings.height);
        let mut timer = FrameTimer::default();

        for index in 0..frame_total {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::debug!(frame = index, "Cancellation observed at frame boundary");
                return Err(ReelcutError::Cancelled);
            }

            timer.begin_frame();
            let time = frame_time_secs(index, fps);
            let scene = builder.build(timeline, time);
            renderer.render(&scene, index, &mut surface);
            let payload = surface.to_data_url()?;
            recorder.add_frame(&payload, index)?;
            timer.end_frame();

            let done = index + 1;
            self.publish(ExportProgress {
                is_exporting: true,
                state: ExportState::Rendering,
                progress: done as f64 / frame_total as f64 * 100.0,
                current_frame: done,
                total_frames: frame_total,
                estimated_time_remaining: timer.eta_secs(frame_total - done),
                status: format!("Rendering frame {done} of {frame_total}"),
            });

            tokio::task::yield_now().await;
        }

        if self.cancel.load(Ordering::SeqCst) {
            return Err(ReelcutError::Cancelled);
        }
        Ok(())
    }

    fn publish(&self, progress: ExportProgress) {
        self.progress.send_replace(progress);
    }
}

/// Sanitized content of every text element, in timeline order.
pub fn extract_text_content(timeline: &Timeline) -> String {
    timeline
        .elements()
        .filter(|el| el.kind == ElementKind::Text)
        .filter_map(|el| el.text.as_ref())
        .map(|text| validate::sanitize_text_content(&text.content))
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
