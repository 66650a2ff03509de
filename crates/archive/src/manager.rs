//! In-memory zip assembly for media items.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use reelcut_common::blob::Blob;
use reelcut_common::config::ArchiveDefaults;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::media::{MediaItem, MediaOrigin};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Comment stored in every archive.
pub const ARCHIVE_COMMENT: &str = "Created by reelcut";

pub const DEFAULT_ARCHIVE_NAME: &str = "media-export.zip";

pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

pub const ZIP_MIME_TYPE: &str = "application/zip";

/// Entry compression policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflate,
    Store,
}

/// How to finalize an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipExportOptions {
    pub filename: String,
    pub compression: Compression,
    /// Deflate level `0..=9`; ignored for `Store`.
    pub compression_level: i64,
}

impl Default for ZipExportOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_ARCHIVE_NAME.to_string(),
            compression: Compression::Deflate,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ZipExportOptions {
    pub fn from_config(config: &ArchiveDefaults) -> Self {
        Self {
            filename: config.filename.clone(),
            compression: Compression::Deflate,
            compression_level: config.compression_level,
        }
    }

    pub fn stored(mut self) -> Self {
        self.compression = Compression::Store;
        self
    }

    /// `filename` with a `.zip` extension.
    pub fn archive_name(&self) -> String {
        let trimmed = self.filename.trim();
        if trimmed.is_empty() {
            DEFAULT_ARCHIVE_NAME.to_string()
        } else if trimmed.to_ascii_lowercase().ends_with(".zip") {
            trimmed.to_string()
        } else {
            format!("{trimmed}.zip")
        }
    }
}

#[derive(Debug, Clone)]
struct ZipEntry {
    name: String,
    data: Vec<u8>,
}

/// Collects media bytes under collision-free names and writes them as one zip.
///
/// Entries are kept in insertion order, so the same items and options always
/// give byte-identical archives.
#[derive(Debug, Default)]
pub struct ZipManager {
    entries: Vec<ZipEntry>,
    names: HashSet<String>,
}

impl ZipManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Add every item's bytes, calling `on_progress(fraction)` after each.
    ///
    /// Items whose bytes cannot be obtained are skipped with a warning but
    /// still advance progress. Returns the number of entries added.
    pub fn add_media_items<F>(&mut self, items: &[MediaItem], root: Option<&Path>, mut on_progress: F) -> usize
    where
        F: FnMut(f64),
    {
        let total = items.len();
        let mut added = 0;

        for (i, item) in items.iter().enumerate() {
            match item.read_bytes(root) {
                Ok(Some(data)) => {
                    let name = self.add_bytes(&entry_name_for(item), data);
                    tracing::debug!(media = %item.id, entry = %name, "Added media to archive");
                    added += 1;
                }
                Ok(None) => {
                    tracing::warn!(media = %item.id, name = %item.name, "Media item has no data; skipping");
                }
                Err(err) => {
                    tracing::warn!(media = %item.id, error = %err, "Failed to read media item; skipping");
                }
            }
            on_progress((i + 1) as f64 / total as f64);
        }

        added
    }

    /// Add raw bytes under a sanitized, collision-free version of `name`.
    /// Returns the name actually used.
    pub fn add_bytes(&mut self, name: &str, data: Vec<u8>) -> String {
        let name = self.resolve_name(name);
        self.names.insert(name.clone());
        self.entries.push(ZipEntry {
            name: name.clone(),
            data,
        });
        name
    }

    fn resolve_name(&self, original: &str) -> String {
        let candidate = sanitize_for_windows(original);
        if !self.names.contains(&candidate) {
            return candidate;
        }

        let (base, ext) = split_extension(original);
        let base = sanitize_for_windows(base);
        let ext = ext.map(sanitize_for_windows);
        let mut counter = 1;
        loop {
            let candidate = match &ext {
                Some(ext) => format!("{base} ({counter}).{ext}"),
                None => format!("{base} ({counter})"),
            };
            if !self.names.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Write all entries into a zip archive.
    pub fn generate_zip(&self, options: &ZipExportOptions) -> ReelcutResult<Blob> {
        let file_options = entry_options(options);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.set_comment(ARCHIVE_COMMENT);

        for entry in &self.entries {
            writer
                .start_file(entry.name.as_str(), file_options)
                .map_err(|e| ReelcutError::archive(format!("failed to add '{}': {e}", entry.name)))?;
            writer
                .write_all(&entry.data)
                .map_err(|e| ReelcutError::archive(format!("failed to write '{}': {e}", entry.name)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| ReelcutError::archive(format!("failed to finalize archive: {e}")))?;
        let data = cursor.into_inner();

        tracing::info!(
            entries = self.entries.len(),
            bytes = data.len(),
            compression = ?options.compression,
            "Archive generated"
        );
        Ok(Blob::new(data, ZIP_MIME_TYPE))
    }

    /// Drop all entries.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.names.clear();
    }
}

fn entry_options(options: &ZipExportOptions) -> SimpleFileOptions {
    let base = SimpleFileOptions::default()
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    match options.compression {
        Compression::Store => base.compression_method(CompressionMethod::Stored),
        Compression::Deflate => base
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(options.compression_level.clamp(0, 9))),
    }
}

/// Archive name for an item. Generated items without an extension get one
/// from their MIME type.
pub fn entry_name_for(item: &MediaItem) -> String {
    let name = if item.name.trim().is_empty() {
        item.id.clone()
    } else {
        item.name.clone()
    };
    if item.origin == MediaOrigin::Generated && !name.contains('.') {
        let mime = if item.mime_type.is_empty() {
            "image/png"
        } else {
            item.mime_type.as_str()
        };
        return format!("{name}.{}", extension_for_mime(mime));
    }
    name
}

fn extension_for_mime(mime: &str) -> &str {
    mime.split('/')
        .nth(1)
        .and_then(|sub| sub.split(['+', ';']).next())
        .map(str::trim)
        .filter(|sub| !sub.is_empty())
        .unwrap_or("png")
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => (base, Some(ext)),
        _ => (name, None),
    }
}

/// Entry name used when a file name has nothing storable left.
pub const FALLBACK_ENTRY_NAME: &str = "file";

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Replace characters Windows cannot store and prefix reserved device names.
///
/// Path separators are replaced too, so every entry sits at the archive root.
/// Names made only of dots and whitespace become [`FALLBACK_ENTRY_NAME`].
pub fn sanitize_for_windows(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect();
    if sanitized
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .is_empty()
    {
        return FALLBACK_ENTRY_NAME.to_string();
    }

    let stem = sanitized.split('.').next().unwrap_or_default();
    if WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
    {
        format!("file_{sanitized}")
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reelcut_project_model::media::MediaKind;

    fn item(id: &str, name: &str, data: &[u8]) -> MediaItem {
        MediaItem::from_bytes(id, name, MediaKind::Image, "image/png", data.to_vec())
    }

    #[test]
    fn test_collisions_get_counters() {
        let mut zip = ZipManager::new();
        assert_eq!(zip.add_bytes("clip.mp4", vec![1]), "clip.mp4");
        assert_eq!(zip.add_bytes("clip.mp4", vec![2]), "clip (1).mp4");
        assert_eq!(zip.add_bytes("clip.mp4", vec![3]), "clip (2).mp4");
        assert_eq!(zip.add_bytes("notes", vec![4]), "notes");
        assert_eq!(zip.add_bytes("notes", vec![5]), "notes (1)");
    }

    #[test]
    fn test_windows_sanitization() {
        assert_eq!(sanitize_for_windows("a<b>c:d\"e|f?g*h.png"), "a_b_c_d_e_f_g_h.png");
        assert_eq!(sanitize_for_windows("CON.mp4"), "file_CON.mp4");
        assert_eq!(sanitize_for_windows("lpt1"), "file_lpt1");
        assert_eq!(sanitize_for_windows("console.mp4"), "console.mp4");
        assert_eq!(sanitize_for_windows("../up.png"), ".._up.png");
        assert_eq!(sanitize_for_windows("tab\there"), "tab_here");
    }

    #[test]
    fn test_dot_only_names_fall_back() {
        assert_eq!(sanitize_for_windows(".."), "file");
        assert_eq!(sanitize_for_windows("."), "file");
        assert_eq!(sanitize_for_windows(""), "file");
        assert_eq!(sanitize_for_windows(" . "), "file");
        assert_eq!(sanitize_for_windows(".hidden"), ".hidden");

        let mut zip = ZipManager::new();
        assert_eq!(zip.add_bytes("..", vec![1]), "file");
        assert_eq!(zip.add_bytes("..", vec![2]), "file (1)");
        assert_eq!(zip.add_bytes(".", vec![3]), "file (2)");
    }

    #[test]
    fn test_generated_items_get_extension() {
        let generated = MediaItem::from_bytes("g", "sunset", MediaKind::Image, "image/jpeg", vec![1]).generated();
        assert_eq!(entry_name_for(&generated), "sunset.jpeg");

        let svg = MediaItem::from_bytes("s", "logo", MediaKind::Image, "image/svg+xml", vec![1]).generated();
        assert_eq!(entry_name_for(&svg), "logo.svg");

        let uploaded = MediaItem::from_bytes("u", "raw", MediaKind::Image, "image/png", vec![1]);
        assert_eq!(entry_name_for(&uploaded), "raw");
    }

    #[test]
    fn test_empty_items_do_not_report_progress() {
        let mut zip = ZipManager::new();
        let mut calls = 0;
        let added = zip.add_media_items(&[], None, |_| calls += 1);
        assert_eq!(added, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_progress_counts_skipped_items() {
        let mut missing = item("m", "gone.png", &[]);
        missing.data = None;
        let items = vec![item("a", "a.png", b"aaa"), missing, item("b", "a.png", b"bbb")];

        let mut zip = ZipManager::new();
        let mut fractions = Vec::new();
        let added = zip.add_media_items(&items, None, |f| fractions.push(f));

        assert_eq!(added, 2);
        assert_eq!(fractions.len(), 3);
        assert!((fractions[2] - 1.0).abs() < 1e-12);
        assert_eq!(zip.entry_names(), ["a.png", "a (1).png"]);
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(ZipExportOptions::default().archive_name(), "media-export.zip");
        let opts = ZipExportOptions {
            filename: "bundle".to_string(),
            ..ZipExportOptions::default()
        };
        assert_eq!(opts.archive_name(), "bundle.zip");
    }

    #[test]
    fn test_reset_clears_entries() {
        let mut zip = ZipManager::new();
        zip.add_bytes("a.png", vec![1]);
        zip.reset();
        assert!(zip.is_empty());
        assert_eq!(zip.add_bytes("a.png", vec![1]), "a.png");
    }

    proptest! {
        #[test]
        fn prop_resolved_names_are_unique(names in proptest::collection::vec("[a-zA-Z<>:*]{0,6}(\\.[a-z]{1,3})?", 1..30)) {
            let mut zip = ZipManager::new();
            for name in &names {
                zip.add_bytes(name, vec![0]);
            }
            let unique: HashSet<_> = zip.entry_names().into_iter().collect();
            prop_assert_eq!(unique.len(), names.len());
        }
    }
}
