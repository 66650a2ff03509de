//! Error types shared across reelcut crates.

use std::path::PathBuf;

/// Top-level error type for reelcut operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcutError {
    #[error("Invalid file type: {message}")]
    InvalidFileType { message: String },

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid timeline element '{id}': {reason}")]
    InvalidElement { id: String, reason: String },

    #[error("Invalid timeline: {message}")]
    InvalidTimeline { message: String },

    #[error("Codec initialization failed: {message}")]
    CodecInit { message: String },

    #[error("Encoding failed: {message}")]
    Encoding { message: String },

    #[error("Recorder not initialized: {operation} called outside of an active recording")]
    NotInitialized { operation: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("An export is already in progress")]
    Busy,

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcutError.
pub type ReelcutResult<T> = Result<T, ReelcutError>;

impl ReelcutError {
    pub fn invalid_file_type(msg: impl Into<String>) -> Self {
        Self::InvalidFileType {
            message: msg.into(),
        }
    }

    pub fn invalid_element(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_timeline(msg: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            message: msg.into(),
        }
    }

    pub fn codec_init(msg: impl Into<String>) -> Self {
        Self::CodecInit {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding {
            message: msg.into(),
        }
    }

    pub fn not_initialized(operation: impl Into<String>) -> Self {
        Self::NotInitialized {
            operation: operation.into(),
        }
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error came from input validation (file or timeline).
    ///
    /// Validation errors are raised before any resources are allocated
    /// and are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileType { .. }
                | Self::FileTooLarge { .. }
                | Self::InvalidElement { .. }
                | Self::InvalidTimeline { .. }
        )
    }

    /// A sentence suitable for showing to the person running the export.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidFileType { .. } => {
                "This file type is not supported. Please use a video, audio, or image file."
                    .to_string()
            }
            Self::FileTooLarge { .. } => {
                "This file is too large. Files must be smaller than 2 GB.".to_string()
            }
            Self::InvalidElement { id, reason } => {
                format!("Timeline element '{id}' is invalid: {reason}.")
            }
            Self::InvalidTimeline { message } => {
                format!("Timeline processing error: {message}. Please check your project timeline.")
            }
            Self::CodecInit { .. } => {
                "The video encoder could not be started. Please check that FFmpeg is installed."
                    .to_string()
            }
            Self::Encoding { .. } => {
                "Failed to encode the video. Please try a different format or quality.".to_string()
            }
            Self::NotInitialized { .. } => {
                "The recorder was used before it was started.".to_string()
            }
            Self::Cancelled => "Export cancelled".to_string(),
            Self::Busy => "An export is already running. Please wait for it to finish.".to_string(),
            Self::Archive { .. } => "Failed to create the zip archive.".to_string(),
            Self::Render { .. } => {
                "Failed to render video frames. Please check your timeline elements.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(ReelcutError::invalid_element("e1", "negative start").is_validation());
        assert!(ReelcutError::FileTooLarge { size: 3, limit: 2 }.is_validation());
        assert!(!ReelcutError::encoding("boom").is_validation());
        assert!(!ReelcutError::Cancelled.is_validation());
    }

    #[test]
    fn test_invalid_element_message_names_id() {
        let err = ReelcutError::invalid_element("clip-7", "duration must be positive");
        assert!(err.to_string().contains("clip-7"));
        assert!(err.user_message().contains("clip-7"));
    }

    #[test]
    fn test_user_message_never_empty() {
        let errors = [
            ReelcutError::codec_init("missing wasm"),
            ReelcutError::encoding("exit 1"),
            ReelcutError::not_initialized("add_frame"),
            ReelcutError::Cancelled,
            ReelcutError::Busy,
            ReelcutError::archive("disk full"),
            ReelcutError::unsupported("mov"),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
