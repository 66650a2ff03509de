//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Video export defaults.
    pub export: ExportDefaults,

    /// Zip archive defaults.
    pub archive: ArchiveDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default video export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output frame rate used when a timeline does not carry one.
    pub fps: u32,

    /// Default container (`mp4`, `webm`, `mov`).
    pub format: String,

    /// Default quality preset (`high`, `medium`, `low`).
    pub quality: String,

    /// Name or path of the ffmpeg binary.
    pub ffmpeg_binary: String,

    /// TrueType/OpenType font used for text elements.
    pub font_path: Option<PathBuf>,
}

/// Default zip archive parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveDefaults {
    /// Archive file name.
    pub filename: String,

    /// Deflate level (0-9).
    pub compression_level: i64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut_render_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            format: "mp4".to_string(),
            quality: "high".to_string(),
            ffmpeg_binary: "ffmpeg".to_string(),
            font_path: None,
        }
    }
}

impl Default for ArchiveDefaults {
    fn default() -> Self {
        Self {
            filename: "media-export.zip".to_string(),
            compression_level: 6,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}
