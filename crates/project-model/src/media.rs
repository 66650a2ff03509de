//! Media items referenced by timeline elements.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Broad media category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// Category from a MIME type prefix (`video/`, `audio/`, `image/`).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next()?.trim().to_ascii_lowercase();
        match top.as_str() {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Where a media item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaOrigin {
    /// Imported by the user from disk.
    #[default]
    Upload,
    /// Produced by a generator; the name may lack an extension.
    Generated,
}

/// An entry in the project's media store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,

    /// Display / archive name.
    pub name: String,

    pub kind: MediaKind,

    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,

    /// Path to the bytes, relative to the project root or absolute.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub origin: MediaOrigin,

    /// In-memory bytes; takes precedence over `path`.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

impl MediaItem {
    pub fn from_path(
        id: impl Into<String>,
        kind: MediaKind,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: id.into(),
            name,
            kind,
            mime_type: mime_type.into(),
            path: Some(path),
            origin: MediaOrigin::Upload,
            data: None,
        }
    }

    pub fn from_bytes(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: MediaKind,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            mime_type: mime_type.into(),
            path: None,
            origin: MediaOrigin::Upload,
            data: Some(data),
        }
    }

    pub fn generated(mut self) -> Self {
        self.origin = MediaOrigin::Generated;
        self
    }

    /// Resolve `path` against `root` when it is relative.
    pub fn resolved_path(&self, root: Option<&Path>) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        match root {
            Some(root) if path.is_relative() => Some(root.join(path)),
            _ => Some(path.clone()),
        }
    }

    /// Bytes of the item: inline data first, then the file at `path`.
    ///
    /// Returns `Ok(None)` when the item has neither.
    pub fn read_bytes(&self, root: Option<&Path>) -> std::io::Result<Option<Vec<u8>>> {
        if let Some(data) = &self.data {
            return Ok(Some(data.clone()));
        }
        match self.resolved_path(root) {
            Some(path) => std::fs::read(path).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("AUDIO/mpeg"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_mime("text/html"), None);
    }

    #[test]
    fn test_read_bytes_prefers_inline_data() {
        let item = MediaItem::from_bytes("m", "a.png", MediaKind::Image, "image/png", vec![1, 2]);
        assert_eq!(item.read_bytes(None).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_read_bytes_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("media")).unwrap();
        std::fs::write(dir.path().join("media/clip.mp4"), b"abc").unwrap();

        let item = MediaItem::from_path("m", MediaKind::Video, "video/mp4", "media/clip.mp4");
        assert_eq!(item.name, "clip.mp4");
        assert_eq!(
            item.read_bytes(Some(dir.path())).unwrap(),
            Some(b"abc".to_vec())
        );
    }

    #[test]
    fn test_read_bytes_without_source() {
        let mut item = MediaItem::from_bytes("m", "x", MediaKind::Image, "image/png", vec![]);
        item.data = None;
        assert_eq!(item.read_bytes(None).unwrap(), None);
    }

    #[test]
    fn test_data_is_not_serialized() {
        let item = MediaItem::from_bytes("m", "x.png", MediaKind::Image, "image/png", vec![9; 4])
            .generated();
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("data"));
        assert!(json.contains("\"generated\""));
    }
}
