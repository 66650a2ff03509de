//! Reelcut Render Engine
//!
//! Turns a timeline into a finished video file without any server-side
//! rendering: every output frame is rasterized locally and the ordered
//! frame sequence is encoded in one pass.
//!
//! # Pipeline Architecture
//!
//! ```text
//! timeline + settings
//!        │
//!        ├── validate (elements, sizes, file names)
//!        ▼
//! for frame in 0..ceil(duration × fps):
//!        │
//!        ├── SceneBuilder ── MediaSource (decoded stills / video frames)
//!        ▼
//!    SceneGraph ──► SceneRenderer ──► Surface ──► PNG data URL
//!                                                   │
//!                                                   ▼
//!                                        FfmpegVideoRecorder (buffer)
//!        │
//!        ▼
//! stop_recording ──► CodecEngine (ffmpeg) ──► Blob (video/mp4 | video/webm)
//! ```

pub mod codec;
pub mod export;
pub mod media;
pub mod recorder;
pub mod renderer;
pub mod scene;
pub mod validate;

pub use codec::{CodecEngine, EncodeOptions, FfmpegCliEngine, ImageFrame, VideoContainer};
pub use export::*;
pub use media::{EmptyMediaSource, MediaError, MediaLibrary, MediaSource};
pub use recorder::{AudioStream, FfmpegVideoRecorder, RecorderState};
pub use renderer::{SceneRenderer, Surface};
pub use scene::{SceneBuilder, SceneGraph, SceneNode};
pub use validate::{sanitize_file_name, validate_file, validate_timeline, FileDescriptor};
