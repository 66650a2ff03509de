//! Frame-accumulating video recorder.
//!
//! The recorder buffers PNG frames in the order they arrive and hands the
//! whole sequence to a [`CodecEngine`] once, on stop.
//!
//! ```text
//!            start_recording()          stop_recording()
//!   Idle ─────────────────────► Recording ───────────────► Stopped
//!    ▲                              │                         │
//!    └────────── cleanup() ─────────┴─────────────────────────┘
//! ```

use base64::Engine as _;
use reelcut_common::blob::Blob;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::export::ExportFormat;

use crate::codec::{frame_name, CodecEngine, EncodeOptions, ImageFrame, VideoContainer};

/// Recorder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

/// Audio source description. Accepted but not muxed on this path.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    pub label: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Buffers frames and drives a codec engine to produce one video blob.
pub struct FfmpegVideoRecorder {
    engine: Box<dyn CodecEngine>,
    fps: u32,
    container: VideoContainer,
    output_size: Option<(u32, u32)>,
    state: RecorderState,
    frames: Vec<ImageFrame>,
    first_index: Option<u64>,
    last_index: Option<u64>,
}

impl std::fmt::Debug for FfmpegVideoRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegVideoRecorder")
            .field("engine", &self.engine.name())
            .field("fps", &self.fps)
            .field("container", &self.container)
            .field("state", &self.state)
            .field("frames", &self.frames.len())
            .finish()
    }
}

impl FfmpegVideoRecorder {
    pub fn new(engine: Box<dyn CodecEngine>, fps: u32, format: ExportFormat) -> Self {
        let (container, coerced) = VideoContainer::resolve(format);
        if coerced {
            tracing::debug!(requested = %format, used = %container, "Container substituted");
        }
        Self {
            engine,
            fps: fps.max(1),
            container,
            output_size: None,
            state: RecorderState::Idle,
            frames: Vec::new(),
            first_index: None,
            last_index: None,
        }
    }

    /// Scale the encoded output to `(width, height)`.
    pub fn with_output_size(mut self, width: u32, height: u32) -> Self {
        self.output_size = Some((width, height));
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn container(&self) -> VideoContainer {
        self.container
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Load the codec engine and begin a fresh frame buffer.
    pub async fn start_recording(&mut self) -> ReelcutResult<()> {
        if self.state == RecorderState::Recording {
            tracing::warn!(buffered = self.frames.len(), "Recorder restarted while recording");
        }
        self.release();
        self.engine
            .load()
            .await
            .map_err(|e| ReelcutError::codec_init(format!("{} failed to load: {e:#}", self.engine.name())))?;
        self.state = RecorderState::Recording;
        tracing::info!(
            engine = self.engine.name(),
            fps = self.fps,
            container = %self.container,
            "Recording started"
        );
        Ok(())
    }

    /// Decode a `data:image/png;base64,...` payload and append it as frame `index`.
    ///
    /// Frames are kept in call order; callers supply strictly increasing
    /// indices.
    pub fn add_frame(&mut self, data_url: &str, index: u64) -> ReelcutResult<()> {
        if self.state != RecorderState::Recording {
            return Err(ReelcutError::not_initialized("add_frame"));
        }
        if let Some(last) = self.last_index {
            if index <= last {
                tracing::warn!(index, last, "Frame index is not increasing");
            }
        }

        let data = decode_data_url(data_url)?;
        self.frames.push(ImageFrame {
            name: frame_name(index),
            data,
        });
        self.first_index.get_or_insert(index);
        self.last_index = Some(index);
        Ok(())
    }

    /// Encode the buffered frames and return the finished video.
    ///
    /// The frame buffer is released whether or not encoding succeeds.
    pub async fn stop_recording(&mut self) -> ReelcutResult<Blob> {
        if self.state != RecorderState::Recording {
            return Err(ReelcutError::not_initialized("stop_recording"));
        }

        let opts = EncodeOptions {
            fps: self.fps,
            container: self.container,
            start_number: self.first_index.unwrap_or(0),
            size: self.output_size,
        };
        tracing::info!(frames = self.frames.len(), container = %self.container, "Encoding video");

        let result = self.engine.encode(&self.frames, &opts).await;
        self.release();
        self.state = RecorderState::Stopped;

        let bytes = result.map_err(|e| ReelcutError::encoding(format!("{e:#}")))?;
        Ok(Blob::new(bytes, self.container.mime_type()))
    }

    /// Audio muxing is not supported by this recorder; the stream is ignored.
    pub fn set_audio_stream(&mut self, stream: Option<AudioStream>) {
        if let Some(stream) = stream {
            tracing::debug!(label = %stream.label, "Audio stream ignored; video-only recorder");
        }
    }

    /// Drop buffered frames and return to `Idle`.
    pub fn cleanup(&mut self) {
        if !self.frames.is_empty() {
            tracing::debug!(frames = self.frames.len(), "Releasing buffered frames");
        }
        self.release();
        self.state = RecorderState::Idle;
    }

    fn release(&mut self) {
        self.frames = Vec::new();
        self.first_index = None;
        self.last_index = None;
    }
}

/// Bytes of a base64 data URL (`data:<mime>;base64,<payload>`).
pub fn decode_data_url(data_url: &str) -> ReelcutResult<Vec<u8>> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| ReelcutError::encoding("frame payload is not a data URL"))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(ReelcutError::encoding(format!(
            "unsupported frame payload header '{header}'"
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ReelcutError::encoding(format!("invalid base64 frame payload: {e}")))
}
