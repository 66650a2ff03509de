//! Codec engines: turn an ordered PNG frame sequence into a video file.

use std::path::Path;

use async_trait::async_trait;
use reelcut_project_model::export::ExportFormat;
use tokio::process::Command;

/// Zero-padded digits in a frame name.
pub const FRAME_NAME_DIGITS: usize = 5;

/// `ffmpeg` input pattern matching [`frame_name`].
pub const FRAME_PATTERN: &str = "frame-%05d.png";

/// `frame-00042.png`
pub fn frame_name(index: u64) -> String {
    format!("frame-{index:0width$}.png", width = FRAME_NAME_DIGITS)
}

/// One captured frame, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub name: String,
    pub data: Vec<u8>,
}

/// Containers the codec path can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    Mp4,
    Webm,
}

impl VideoContainer {
    /// Container for a requested format and whether it was substituted.
    ///
    /// MOV has no encoder on this path and is produced as MP4.
    pub fn resolve(format: ExportFormat) -> (Self, bool) {
        match format {
            ExportFormat::Mp4 => (Self::Mp4, false),
            ExportFormat::Webm => (Self::Webm, false),
            ExportFormat::Mov => (Self::Mp4, true),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// Video codec arguments for ffmpeg.
    pub fn codec_args(self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Mp4 => &[
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-crf",
                "23",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ],
            Self::Webm => &[
                "-c:v",
                "libvpx-vp9",
                "-crf",
                "32",
                "-b:v",
                "0",
                "-pix_fmt",
                "yuv420p",
            ],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for VideoContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parameters for one encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub fps: u32,
    pub container: VideoContainer,
    /// Index of the first frame in the sequence.
    pub start_number: u64,
    /// Output size; `None` keeps the frame size.
    pub size: Option<(u32, u32)>,
}

/// Something that can encode a frame sequence.
#[async_trait]
pub trait CodecEngine: Send {
    /// Prepare the engine. Must succeed before `encode`.
    async fn load(&mut self) -> anyhow::Result<()>;

    /// Encode `frames` (already ordered) into a single container.
    async fn encode(&mut self, frames: &[ImageFrame], opts: &EncodeOptions) -> anyhow::Result<Vec<u8>>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

/// Encodes by running the `ffmpeg` binary over a temporary frame directory.
#[derive(Debug, Clone)]
pub struct FfmpegCliEngine {
    binary: String,
    loaded: bool,
}

impl FfmpegCliEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            loaded: false,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn build_args(&self, dir: &Path, output: &Path, opts: &EncodeOptions) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-framerate".to_string(),
            opts.fps.to_string(),
            "-start_number".to_string(),
            opts.start_number.to_string(),
            "-i".to_string(),
            dir.join(FRAME_PATTERN).to_string_lossy().into_owned(),
        ];
        if let Some((w, h)) = opts.size {
            // yuv420p needs even dimensions.
            args.push("-vf".to_string());
            args.push(format!("scale={}:{}", (w - w % 2).max(2), (h - h % 2).max(2)));
        }
        args.extend(opts.container.codec_args());
        args.push("-r".to_string());
        args.push(opts.fps.to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl CodecEngine for FfmpegCliEngine {
    async fn load(&mut self) -> anyhow::Result<()> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("failed to run '{}': {e}", self.binary))?;
        if !output.status.success() {
            anyhow::bail!("'{} -version' exited with {}", self.binary, output.status);
        }
        let version = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(
            binary = %self.binary,
            version = version.lines().next().unwrap_or_default(),
            "ffmpeg engine loaded"
        );
        self.loaded = true;
        Ok(())
    }

    async fn encode(&mut self, frames: &[ImageFrame], opts: &EncodeOptions) -> anyhow::Result<Vec<u8>> {
        if !self.loaded {
            anyhow::bail!("ffmpeg engine used before load");
        }
        if frames.is_empty() {
            anyhow::bail!("no frames to encode");
        }

        let dir = tempfile::Builder::new().prefix("reelcut-frames-").tempdir()?;
        for frame in frames {
            tokio::fs::write(dir.path().join(&frame.name), &frame.data).await?;
        }

        let output_path = dir.path().join(format!("output.{}", opts.container.extension()));
        let args = self.build_args(dir.path(), &output_path, opts);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let started = std::time::Instant::now();
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start ffmpeg: {e}"))?;

        if !output.status.success() {
            anyhow::bail!(
                "ffmpeg encode failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let bytes = tokio::fs::read(&output_path).await?;
        tracing::info!(
            frames = frames.len(),
            bytes = bytes.len(),
            container = %opts.container,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg encode finished"
        );
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "ffmpeg-cli"
    }
}
