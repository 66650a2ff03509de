//! Export format, quality presets, and settings.

use serde::{Deserialize, Serialize};

/// Requested output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Mp4,
    Webm,
    Mov,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "mov" => Some(Self::Mov),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    /// 1080p
    #[default]
    High,
    /// 720p
    Medium,
    /// 480p
    Low,
}

impl ExportQuality {
    /// Output `(width, height)` for this preset.
    pub fn resolution(self) -> (u32, u32) {
        match self {
            Self::High => (1920, 1080),
            Self::Medium => (1280, 720),
            Self::Low => (854, 480),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "1080p",
            Self::Medium => "720p",
            Self::Low => "480p",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "1080p" => Some(Self::High),
            "medium" | "720p" => Some(Self::Medium),
            "low" | "480p" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Settings for one video export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub quality: ExportQuality,
    /// Base name without extension; sanitized before use.
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

impl ExportSettings {
    /// Settings with the quality preset's resolution and a timestamped filename.
    pub fn new(format: ExportFormat, quality: ExportQuality) -> Self {
        let (width, height) = quality.resolution();
        Self {
            format,
            quality,
            filename: default_filename(),
            width,
            height,
        }
    }

    /// Settings from configured format and quality names. Unknown names
    /// keep the default for that field and are returned in `unknown`.
    pub fn from_names(format: &str, quality: &str) -> (Self, Vec<String>) {
        let mut unknown = Vec::new();
        let format = ExportFormat::parse(format).unwrap_or_else(|| {
            unknown.push(format.to_string());
            ExportFormat::default()
        });
        let quality = ExportQuality::parse(quality).unwrap_or_else(|| {
            unknown.push(quality.to_string());
            ExportQuality::default()
        });
        (Self::new(format, quality), unknown)
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::new(ExportFormat::default(), ExportQuality::default())
    }
}

/// `export_YYYY-MM-DD_HH-MM` in local time.
pub fn default_filename() -> String {
    format!("export_{}", chrono::Local::now().format("%Y-%m-%d_%H-%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_presets() {
        assert_eq!(ExportQuality::High.resolution(), (1920, 1080));
        assert_eq!(ExportQuality::Medium.resolution(), (1280, 720));
        assert_eq!(ExportQuality::Low.resolution(), (854, 480));
    }

    #[test]
    fn test_settings_apply_preset() {
        let settings = ExportSettings::new(ExportFormat::Webm, ExportQuality::Medium);
        assert_eq!((settings.width, settings.height), (1280, 720));
        assert!(settings.filename.starts_with("export_"));
        // export_ + YYYY-MM-DD_HH-MM
        assert_eq!(settings.filename.len(), "export_".len() + 16);
    }

    #[test]
    fn test_parse_format_and_quality() {
        assert_eq!(ExportFormat::parse("MOV"), Some(ExportFormat::Mov));
        assert_eq!(ExportFormat::parse("avi"), None);
        assert_eq!(ExportQuality::parse("720p"), Some(ExportQuality::Medium));
        assert_eq!(ExportQuality::parse("ultra"), None);
    }

    #[test]
    fn test_settings_from_names() {
        let (settings, unknown) = ExportSettings::from_names("webm", "low");
        assert_eq!(settings.format, ExportFormat::Webm);
        assert_eq!(settings.quality, ExportQuality::Low);
        assert_eq!((settings.width, settings.height), (854, 480));
        assert!(unknown.is_empty());

        let (settings, unknown) = ExportSettings::from_names("avi", "medium");
        assert_eq!(settings.format, ExportFormat::Mp4);
        assert_eq!(settings.quality, ExportQuality::Medium);
        assert_eq!(unknown, ["avi"]);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ExportFormat::Webm).unwrap();
        assert_eq!(json, "\"webm\"");
        let quality: ExportQuality = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(quality, ExportQuality::Low);
    }
}
