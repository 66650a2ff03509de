//! Input validation at the export boundary.
//!
//! Everything here is pure: file checks operate on a [`FileDescriptor`]
//! and timeline checks on the in-memory [`Timeline`]. Nothing is
//! allocated for rendering until these pass.

use std::collections::HashSet;
use std::path::Path;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::media::MediaKind;
use reelcut_project_model::timeline::{Color, ElementKind, Timeline, TimelineElement};

/// Hard ceiling on accepted file size. Files of exactly this size are rejected.
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "flac"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Name used when sanitization leaves nothing behind.
pub const FALLBACK_FILE_NAME: &str = "export";

/// Estimated frame-buffer size above which a warning is logged.
pub const MEMORY_WARN_MB: u64 = 1000;
/// Estimated frame-buffer size above which a stronger warning is logged.
pub const MEMORY_CRITICAL_MB: u64 = 2000;

/// Largest accepted output width or height (8K UHD long side).
pub const MAX_OUTPUT_SIDE: u32 = 7680;
/// Largest accepted output pixel count (8K UHD).
pub const MAX_OUTPUT_PIXELS: u64 = 7680 * 4320;
/// Largest accepted text size in canvas pixels.
pub const MAX_FONT_SIZE: f64 = 1000.0;
/// Largest accepted blur sigma in canvas pixels.
pub const MAX_BLUR: f64 = 250.0;

/// What is known about a file before it enters the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    /// Declared MIME type; may be empty.
    pub mime_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Describe a file on disk, inferring the MIME type from its extension.
    pub fn from_path(path: &Path) -> ReelcutResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReelcutError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ReelcutError::Io(e),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = extension_of(&name)
            .and_then(|ext| mime_for_extension(&ext))
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            name,
            mime_type,
            size: metadata.len(),
        })
    }

    /// Media category implied by the extension, if allow-listed.
    pub fn kind(&self) -> Option<MediaKind> {
        extension_of(&self.name).and_then(|ext| kind_for_extension(&ext))
    }
}

/// Lowercased extension of `name`, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Category of an allow-listed extension.
pub fn kind_for_extension(ext: &str) -> Option<MediaKind> {
    let ext = ext.to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// MIME type for an allow-listed extension.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

/// Reject files whose type is not allow-listed or whose size is at or above
/// [`MAX_FILE_SIZE`].
///
/// Both checks are evaluated before either error is returned; a type
/// failure takes precedence.
pub fn validate_file(file: &FileDescriptor) -> ReelcutResult<()> {
    let type_check = check_file_type(file);
    let size_check = if file.size >= MAX_FILE_SIZE {
        Err(ReelcutError::FileTooLarge {
            size: file.size,
            limit: MAX_FILE_SIZE,
        })
    } else {
        Ok(())
    };

    type_check?;
    size_check
}

fn check_file_type(file: &FileDescriptor) -> ReelcutResult<()> {
    let ext = extension_of(&file.name).ok_or_else(|| {
        ReelcutError::invalid_file_type(format!("'{}' has no file extension", file.name))
    })?;
    let ext_kind = kind_for_extension(&ext).ok_or_else(|| {
        ReelcutError::invalid_file_type(format!("extension '.{ext}' is not supported"))
    })?;

    let mime = file.mime_type.trim();
    if mime.is_empty() {
        return Ok(());
    }
    match MediaKind::from_mime(mime) {
        Some(kind) if kind == ext_kind => Ok(()),
        _ => Err(ReelcutError::invalid_file_type(format!(
            "content type '{mime}' does not match extension '.{ext}'"
        ))),
    }
}

/// Make `name` safe to use as a single path component.
///
/// Traversal sequences are removed until none remain, leftover separators
/// become `_`, control characters are dropped, and leading/trailing dots
/// and whitespace are trimmed.
pub fn sanitize_file_name(name: &str) -> String {
    let mut current = name.to_string();
    loop {
        let next = current.replace("../", "").replace("..\\", "");
        if next == current {
            break;
        }
        current = next;
    }

    let cleaned: String = current
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the output file name: sanitized stem plus `extension`.
///
/// A trailing video extension already present in `name` is dropped so
/// `clip.mp4` does not become `clip.mp4.mp4`.
pub fn output_file_name(name: &str, extension: &str) -> String {
    let trimmed = name.trim();
    let stem = match trimmed.rsplit_once('.') {
        Some((stem, ext))
            if VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => trimmed,
    };
    format!("{}.{extension}", sanitize_file_name(stem))
}

/// Check an output size against the accepted range.
///
/// Portrait sizes are accepted up to the same long side as landscape.
pub fn validate_output_size(width: u32, height: u32) -> ReelcutResult<()> {
    check_size("output", width, height)
}

fn check_size(what: &str, width: u32, height: u32) -> ReelcutResult<()> {
    if width == 0 || height == 0 {
        return Err(ReelcutError::invalid_timeline(format!(
            "{what} size {width}x{height} must be non-zero"
        )));
    }
    if width > MAX_OUTPUT_SIDE
        || height > MAX_OUTPUT_SIDE
        || width as u64 * height as u64 > MAX_OUTPUT_PIXELS
    {
        return Err(ReelcutError::invalid_timeline(format!(
            "{what} size {width}x{height} exceeds the {MAX_OUTPUT_SIDE}x4320 limit"
        )));
    }
    Ok(())
}

/// Structural validation of a timeline before export.
///
/// Fails with `InvalidTimeline` for whole-timeline problems and with
/// `InvalidElement` naming the first offending element otherwise.
pub fn validate_timeline(timeline: &Timeline) -> ReelcutResult<()> {
    if timeline.fps == 0 {
        return Err(ReelcutError::invalid_timeline("frame rate must be greater than zero"));
    }
    if let Some(canvas) = timeline.canvas {
        check_size("canvas", canvas.width, canvas.height)?;
    }
    if Color::parse_hex(&timeline.background).is_none() {
        return Err(ReelcutError::invalid_timeline(format!(
            "background '{}' is not a hex color",
            timeline.background
        )));
    }

    for track in &timeline.tracks {
        if !(0.0..=1.0).contains(&track.volume) {
            return Err(ReelcutError::invalid_timeline(format!(
                "track '{}' volume {} is outside [0, 1]",
                track.id, track.volume
            )));
        }

        let mut seen = HashSet::new();
        for element in &track.elements {
            validate_element(element)?;
            if !seen.insert(element.id.as_str()) {
                return Err(ReelcutError::invalid_element(
                    &element.id,
                    format!("duplicate id in track '{}'", track.id),
                ));
            }
        }
    }

    if timeline.duration() <= 0.0 {
        return Err(ReelcutError::invalid_timeline("timeline is empty"));
    }

    Ok(())
}

/// Validate a single element.
pub fn validate_element(element: &TimelineElement) -> ReelcutResult<()> {
    let id = element.id.as_str();
    let fail = |reason: String| Err(ReelcutError::invalid_element(display_id(id), reason));

    if id.trim().is_empty() {
        return fail("element id is empty".to_string());
    }
    if element.kind == ElementKind::Unknown {
        return fail("unrecognized element type".to_string());
    }
    if !element.start_time.is_finite() || element.start_time < 0.0 {
        return fail(format!("start time {} must be >= 0", element.start_time));
    }
    if !element.duration.is_finite() || element.duration <= 0.0 {
        return fail(format!("duration {} must be > 0", element.duration));
    }
    if !(element.trim_start >= 0.0) || !(element.trim_end >= 0.0) {
        return fail("trim values must be >= 0".to_string());
    }
    if let Some(volume) = element.volume {
        if !(0.0..=1.0).contains(&volume) {
            return fail(format!("volume {volume} is outside [0, 1]"));
        }
    }
    if let Some(fx) = element.effects {
        if !(fx.blur >= 0.0) || !fx.blur.is_finite() {
            return fail(format!("blur {} must be >= 0", fx.blur));
        }
        if fx.blur > MAX_BLUR {
            return fail(format!("blur {} exceeds {MAX_BLUR}", fx.blur));
        }
        if !(0.0..=100.0).contains(&fx.opacity) {
            return fail(format!("opacity {} is outside [0, 100]", fx.opacity));
        }
    }
    if let Some(transform) = element.transform {
        let finite = [transform.x, transform.y, transform.width, transform.height, transform.rotation]
            .iter()
            .all(|v| v.is_finite());
        if !finite || transform.width <= 0.0 || transform.height <= 0.0 {
            return fail("transform must be finite with positive size".to_string());
        }
    }

    match element.kind {
        ElementKind::Text => {
            let Some(text) = &element.text else {
                return fail("text element has no text".to_string());
            };
            if !(text.font_size > 0.0) || !text.font_size.is_finite() {
                return fail(format!("font size {} must be > 0", text.font_size));
            }
            if text.font_size > MAX_FONT_SIZE {
                return fail(format!("font size {} exceeds {MAX_FONT_SIZE}", text.font_size));
            }
            if Color::parse_hex(&text.color).is_none() {
                return fail(format!("text color '{}' is not a hex color", text.color));
            }
        }
        ElementKind::Video | ElementKind::Audio | ElementKind::Image => {
            let has_media = element
                .media_id
                .as_deref()
                .is_some_and(|m| !m.trim().is_empty());
            if !has_media {
                return fail(format!("{} element has no media reference", element.kind.as_str()));
            }
        }
        ElementKind::Unknown => {}
    }

    Ok(())
}

fn display_id(id: &str) -> &str {
    if id.trim().is_empty() {
        "<empty>"
    } else {
        id
    }
}

/// Reduce untrusted text to inert plain text.
///
/// `<script>` and `<style>` blocks are dropped with their bodies, every
/// other tag is stripped, and any remaining markup characters are escaped.
pub fn sanitize_text_content(input: &str) -> String {
    let without_blocks = strip_block(&strip_block(input, "script"), "style");
    let without_tags = strip_tags(&without_blocks);
    escape_html(&without_tags)
}

fn strip_block(input: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        // ASCII lowercasing keeps byte offsets aligned with `rest`.
        let lower = rest.to_ascii_lowercase();
        let Some(start) = lower.find(&open) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);

        let after_open = start + open.len();
        let end = lower[after_open..]
            .find(&close)
            .map(|rel| after_open + rel)
            .and_then(|close_at| lower[close_at..].find('>').map(|gt| close_at + gt + 1));
        match end {
            Some(end) => rest = &rest[end..],
            None => break,
        }
    }
    out
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let candidate = &rest[lt + 1..];
        let looks_like_tag = candidate
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        match candidate.find('>') {
            Some(gt) if looks_like_tag => rest = &candidate[gt + 1..],
            _ => {
                out.push('<');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Severity of an estimated frame-buffer footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLevel {
    Ok,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEstimate {
    pub estimated_mb: u64,
    pub level: MemoryLevel,
}

impl MemoryEstimate {
    pub fn warning(&self) -> Option<&'static str> {
        match self.level {
            MemoryLevel::Ok => None,
            MemoryLevel::High => {
                Some("High memory usage expected. Consider reducing quality or duration.")
            }
            MemoryLevel::Critical => {
                Some("Very high memory usage. Export may fail on low-memory machines.")
            }
        }
    }
}

/// Uncompressed RGBA footprint of every frame of an export, in MB.
pub fn estimate_memory_usage(width: u32, height: u32, duration_secs: f64, fps: u32) -> MemoryEstimate {
    let frames = reelcut_common::clock::total_frames(duration_secs, fps);
    let bytes = width as f64 * height as f64 * 4.0 * frames as f64;
    let estimated_mb = (bytes / (1024.0 * 1024.0)).round() as u64;

    let level = if estimated_mb > MEMORY_CRITICAL_MB {
        MemoryLevel::Critical
    } else if estimated_mb > MEMORY_WARN_MB {
        MemoryLevel::High
    } else {
        MemoryLevel::Ok
    };

    MemoryEstimate {
        estimated_mb,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reelcut_project_model::timeline::{CanvasSize, EffectValues, Track, TrackKind};

    fn timeline_with(element: TimelineElement) -> Timeline {
        let mut timeline = Timeline::new();
        timeline.push_track(Track::new("t", TrackKind::Video).with_element(element));
        timeline
    }

    #[test]
    fn test_accepts_allow_listed_files() {
        validate_file(&FileDescriptor::new("clip.MP4", "video/mp4", 1024)).unwrap();
        validate_file(&FileDescriptor::new("song.flac", "", 1024)).unwrap();
        validate_file(&FileDescriptor::new("still.jpeg", "image/jpeg", 1)).unwrap();
    }

    #[test]
    fn test_rejects_html_with_video_type() {
        let err = validate_file(&FileDescriptor::new("page.html", "video/mp4", 10)).unwrap_err();
        assert!(matches!(err, ReelcutError::InvalidFileType { .. }));
    }

    #[test]
    fn test_rejects_category_mismatch() {
        let err = validate_file(&FileDescriptor::new("clip.mp4", "image/png", 10)).unwrap_err();
        assert!(matches!(err, ReelcutError::InvalidFileType { .. }));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let err = validate_file(&FileDescriptor::new("big.mp4", "video/mp4", MAX_FILE_SIZE))
            .unwrap_err();
        assert!(matches!(err, ReelcutError::FileTooLarge { .. }));

        let err = validate_file(&FileDescriptor::new("big.mp4", "video/mp4", MAX_FILE_SIZE + 1))
            .unwrap_err();
        assert!(matches!(err, ReelcutError::FileTooLarge { size, .. } if size == MAX_FILE_SIZE + 1));

        validate_file(&FileDescriptor::new("ok.mp4", "video/mp4", MAX_FILE_SIZE - 1)).unwrap();
    }

    #[test]
    fn test_descriptor_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let file = FileDescriptor::from_path(&path).unwrap();
        assert_eq!(file.mime_type, "audio/wav");
        assert_eq!(file.size, 16);
        assert_eq!(file.kind(), Some(MediaKind::Audio));

        let missing = FileDescriptor::from_path(&dir.path().join("nope.mp4")).unwrap_err();
        assert!(matches!(missing, ReelcutError::FileNotFound { .. }));
    }

    #[test]
    fn test_sanitize_traversal() {
        let out = sanitize_file_name("../../../etc/passwd.mp4");
        assert!(!out.contains("../"));
        assert!(!out.contains("..\\"));
        assert_eq!(out, "etc_passwd.mp4");

        assert_eq!(sanitize_file_name("..\\..\\win.ini"), "win.ini");
        assert_eq!(sanitize_file_name("....//"), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name("  my video\u{7}.webm "), "my video.webm");
        assert_eq!(sanitize_file_name(""), FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_negative_times_are_rejected() {
        let timeline = timeline_with(TimelineElement::video("bad", "m", -1000.0, -5000.0));
        let err = validate_timeline(&timeline).unwrap_err();
        match err {
            ReelcutError::InvalidElement { id, .. } => assert_eq!(id, "bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_id_and_unknown_type() {
        let timeline = timeline_with(TimelineElement::video("", "m", 0.0, 1.0));
        assert!(matches!(
            validate_timeline(&timeline),
            Err(ReelcutError::InvalidElement { .. })
        ));

        let mut el = TimelineElement::video("x", "m", 0.0, 1.0);
        el.kind = ElementKind::Unknown;
        let err = validate_timeline(&timeline_with(el)).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_effect_ranges() {
        let el = TimelineElement::image("img", "m", 0.0, 1.0).with_effects(EffectValues {
            blur: 0.0,
            opacity: 150.0,
        });
        assert!(validate_timeline(&timeline_with(el)).is_err());

        let el = TimelineElement::image("img", "m", 0.0, 1.0).with_effects(EffectValues {
            blur: -1.0,
            opacity: 50.0,
        });
        assert!(validate_timeline(&timeline_with(el)).is_err());
    }

    #[test]
    fn test_duplicate_ids_within_track() {
        let mut timeline = Timeline::new();
        timeline.push_track(
            Track::new("t", TrackKind::Video)
                .with_element(TimelineElement::video("a", "m", 0.0, 1.0))
                .with_element(TimelineElement::video("a", "m", 1.0, 1.0)),
        );
        assert!(matches!(
            validate_timeline(&timeline),
            Err(ReelcutError::InvalidElement { .. })
        ));
    }

    #[test]
    fn test_media_reference_required() {
        let mut el = TimelineElement::video("v", "m", 0.0, 1.0);
        el.media_id = None;
        assert!(validate_timeline(&timeline_with(el)).is_err());
    }

    #[test]
    fn test_empty_timeline_is_invalid() {
        assert!(matches!(
            validate_timeline(&Timeline::new()),
            Err(ReelcutError::InvalidTimeline { .. })
        ));
    }

    #[test]
    fn test_valid_timeline_passes() {
        let mut timeline = timeline_with(TimelineElement::video("v", "m", 0.0, 2.0));
        timeline.push_track(
            Track::new("txt", TrackKind::Text)
                .with_element(TimelineElement::text("t", "Hello", 0.5, 1.0)),
        );
        validate_timeline(&timeline).unwrap();
    }

    #[test]
    fn test_output_file_name_drops_known_extension() {
        assert_eq!(output_file_name("clip.mp4", "mp4"), "clip.mp4");
        assert_eq!(output_file_name("clip.MOV", "webm"), "clip.webm");
        assert_eq!(output_file_name("my.video", "mp4"), "my.video.mp4");
        assert_eq!(output_file_name(".mp4", "mp4"), "export.mp4");
        assert_eq!(output_file_name("../../x.webm", "webm"), "x.webm");
    }

    #[test]
    fn test_output_size_bounds() {
        validate_output_size(1920, 1080).unwrap();
        validate_output_size(7680, 4320).unwrap();
        validate_output_size(4320, 7680).unwrap();
        for (w, h) in [(0, 1080), (7681, 4320), (7680, 7680), (u32::MAX, u32::MAX)] {
            assert!(
                matches!(validate_output_size(w, h), Err(ReelcutError::InvalidTimeline { .. })),
                "{w}x{h} should be rejected"
            );
        }
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        let mut timeline = timeline_with(TimelineElement::video("v", "m", 0.0, 1.0));
        timeline.canvas = Some(CanvasSize::new(100_000, 100_000));
        let err = validate_timeline(&timeline).unwrap_err();
        assert!(err.to_string().contains("canvas size"));
    }

    #[test]
    fn test_font_size_and_blur_are_bounded() {
        let mut el = TimelineElement::text("t", "Big", 0.0, 1.0);
        if let Some(text) = el.text.as_mut() {
            text.font_size = 1.0e9;
        }
        let err = validate_timeline(&timeline_with(el)).unwrap_err();
        assert!(err.to_string().contains("font size"));

        let el = TimelineElement::image("img", "m", 0.0, 1.0).with_effects(EffectValues {
            blur: 1.0e9,
            opacity: 100.0,
        });
        assert!(validate_timeline(&timeline_with(el)).is_err());
    }

    #[test]
    fn test_sanitize_text_removes_script() {
        let out = sanitize_text_content("Hi <script>alert('x')</script><b>there</b> & <you>");
        assert!(!out.contains("<script>"));
        assert!(!out.contains("alert"));
        assert_eq!(out, "Hi there &amp; ");

        let out = sanitize_text_content("<SCRIPT src=x>evil()</SCRIPT>ok");
        assert_eq!(out, "ok");

        let out = sanitize_text_content("1 < 2 > 0");
        assert_eq!(out, "1 &lt; 2 &gt; 0");
    }

    #[test]
    fn test_unterminated_script_drops_rest() {
        assert_eq!(sanitize_text_content("safe<script>alert(1)"), "safe");
    }

    #[test]
    fn test_memory_estimate_levels() {
        // 1920x1080 RGBA ~ 7.9 MB per frame.
        assert_eq!(estimate_memory_usage(1920, 1080, 1.0, 30).level, MemoryLevel::Ok);
        let high = estimate_memory_usage(1920, 1080, 5.0, 30);
        assert_eq!(high.level, MemoryLevel::High);
        assert!(high.warning().is_some());
        assert_eq!(estimate_memory_usage(1920, 1080, 20.0, 30).level, MemoryLevel::Critical);
    }

    proptest! {
        #[test]
        fn prop_sanitized_name_has_no_traversal(name in ".{0,64}") {
            let out = sanitize_file_name(&name);
            prop_assert!(!out.is_empty());
            prop_assert!(!out.contains("../"));
            prop_assert!(!out.contains("..\\"));
            prop_assert!(!out.contains('/'));
            prop_assert!(!out.contains('\\'));
        }

        #[test]
        fn prop_sanitized_text_has_no_tags(text in ".{0,128}") {
            let out = sanitize_text_content(&text);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
        }
    }
}
