//! Project metadata and the on-disk bundle.
//!
//! A project ties together the media store, the editing timeline, and the
//! last-used export settings. On disk it is a directory:
//!
//! ```text
//! <root>/
//!   media/              imported media files
//!   meta/project.json   Project
//!   meta/timeline.json  Timeline
//!   exports/            rendered output
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::export::ExportSettings;
use crate::media::MediaItem;
use crate::timeline::{CanvasSize, Timeline};

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// Canvas size; `None` means the 600x320 default.
    #[serde(default)]
    pub canvas: Option<CanvasSize>,

    /// Project frame rate.
    pub fps: u32,

    /// Media store entries.
    #[serde(default)]
    pub media: Vec<MediaItem>,

    /// Last-used export settings.
    #[serde(default)]
    pub export: ExportSettings,
}

impl Project {
    /// Create a new project with defaults.
    pub fn new(name: impl Into<String>, canvas: Option<CanvasSize>, fps: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            modified_at: now,
            canvas,
            fps,
            media: Vec::new(),
            export: ExportSettings::default(),
        }
    }

    pub fn find_media(&self, id: &str) -> Option<&MediaItem> {
        self.media.iter().find(|m| m.id == id)
    }

    /// Bump `modified_at` to now.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    /// Editing timeline.
    pub timeline: Timeline,
}

impl LoadedProject {
    /// Load a project from a directory.
    ///
    /// A missing `timeline.json` yields an empty timeline using the
    /// project's fps and canvas.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        let project_path = root.join("meta").join("project.json");
        let timeline_path = root.join("meta").join("timeline.json");

        let project: Project = read_json(&project_path)?;

        let timeline = if timeline_path.exists() {
            read_json(&timeline_path)?
        } else {
            let mut timeline = Timeline::new();
            timeline.fps = project.fps;
            timeline.canvas = project.canvas;
            timeline
        };

        Ok(Self {
            root,
            project,
            timeline,
        })
    }

    /// Save project and timeline to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        write_json(&meta_dir.join("project.json"), &self.project)?;
        write_json(&meta_dir.join("timeline.json"), &self.timeline)?;
        Ok(())
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        canvas: Option<CanvasSize>,
        fps: u32,
    ) -> Result<Self, ProjectError> {
        if fps == 0 {
            return Err(ProjectError::ValidationError {
                message: "fps must be greater than zero".to_string(),
            });
        }
        let root = root.as_ref().to_path_buf();

        for subdir in &["media", "meta", "exports"] {
            let dir = root.join(subdir);
            std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError {
                path: dir.clone(),
                source: e,
            })?;
        }

        let mut timeline = Timeline::new();
        timeline.fps = fps;
        timeline.canvas = canvas;

        let loaded = Self {
            root,
            project: Project::new(name, canvas, fps),
            timeline,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Directory exports are written to.
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Media items with in-memory bytes or paths resolved against the root.
    pub fn media_items(&self) -> Vec<MediaItem> {
        self.project
            .media
            .iter()
            .map(|item| {
                let mut item = item.clone();
                item.path = item.resolved_path(Some(self.root.as_path()));
                item
            })
            .collect()
    }

    /// Report media files and element references that cannot be resolved.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        for item in &self.project.media {
            match item.resolved_path(Some(self.root.as_path())) {
                Some(path) if !path.exists() => {
                    errors.push(format!("Media '{}' source missing: {}", item.id, path.display()));
                }
                None if item.data.is_none() => {
                    errors.push(format!("Media '{}' has no source path", item.id));
                }
                _ => {}
            }
        }

        for element in self.timeline.elements() {
            if let Some(media_id) = &element.media_id {
                if self.project.find_media(media_id).is_none() {
                    errors.push(format!(
                        "Element '{}' references unknown media '{media_id}'",
                        element.id
                    ));
                }
            }
        }

        errors
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::timeline::{TimelineElement, Track, TrackKind};

    #[test]
    fn test_project_creation() {
        let project = Project::new("Trailer", Some(CanvasSize::new(1280, 720)), 24);
        assert_eq!(project.name, "Trailer");
        assert_eq!(project.fps, 24);
        assert_eq!(project.id.len(), 36);
        assert!(uuid::Uuid::parse_str(&project.id).is_ok());
        assert!(project.media.is_empty());
    }

    #[test]
    fn test_project_ids_are_unique() {
        let a = Project::new("A", None, 30);
        let b = Project::new("B", None, 30);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_project_serialization_defaults() {
        let json = r#"{
            "version": "1.0",
            "name": "Old",
            "id": "abc",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "fps": 30
        }"#;
        let parsed: Project = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.canvas, None);
        assert!(parsed.media.is_empty());
        assert_eq!(parsed.export.width, 1920);
    }

    #[test]
    fn test_loaded_project_create_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");

        let created = LoadedProject::create(&root, "Integration Test", None, 30).unwrap();
        assert_eq!(created.project.name, "Integration Test");
        assert!(root.join("media").is_dir());
        assert!(root.join("exports").is_dir());

        let loaded = LoadedProject::load(&root).unwrap();
        assert_eq!(loaded.project.name, "Integration Test");
        assert_eq!(loaded.timeline.version, "1.0");
        assert_eq!(loaded.timeline.canvas_size(), CanvasSize::DEFAULT);
    }

    #[test]
    fn test_create_rejects_zero_fps() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoadedProject::create(dir.path(), "Bad", None, 0).unwrap_err();
        assert!(matches!(err, ProjectError::ValidationError { .. }));
    }

    #[test]
    fn test_load_missing_project_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoadedProject::load(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::IoError { .. }));
    }

    #[test]
    fn test_validate_sources_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut loaded = LoadedProject::create(dir.path(), "Validate", None, 30).unwrap();
        loaded.project.media.push(MediaItem::from_path(
            "clip",
            MediaKind::Video,
            "video/mp4",
            "media/clip.mp4",
        ));
        loaded.timeline.push_track(
            Track::new("v1", TrackKind::Video)
                .with_element(TimelineElement::video("a", "clip", 0.0, 1.0))
                .with_element(TimelineElement::video("b", "ghost", 1.0, 1.0)),
        );

        let errors = loaded.validate_sources();
        assert!(errors.iter().any(|e| e.contains("Media 'clip' source missing")));
        assert!(errors.iter().any(|e| e.contains("unknown media 'ghost'")));
    }

    #[test]
    fn test_media_items_resolve_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut loaded = LoadedProject::create(dir.path(), "Media", None, 30).unwrap();
        loaded.project.media.push(MediaItem::from_path(
            "img",
            MediaKind::Image,
            "image/png",
            "media/still.png",
        ));
        let items = loaded.media_items();
        assert_eq!(items[0].path, Some(dir.path().join("media/still.png")));
    }
}
