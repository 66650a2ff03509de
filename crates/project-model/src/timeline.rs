//! Timeline, tracks, and elements.
//!
//! A timeline is an ordered list of tracks; each track holds elements of
//! one media kind. Times are in seconds. Later tracks composite on top of
//! earlier ones, and elements within a track draw in insertion order.

use serde::{Deserialize, Serialize};

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Used whenever a project has no canvas size set.
    pub const DEFAULT: CanvasSize = CanvasSize {
        width: 600,
        height: 320,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The multi-track editing timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Tracks in compositing order (first = bottom).
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Canvas size; `None` falls back to [`CanvasSize::DEFAULT`].
    #[serde(default)]
    pub canvas: Option<CanvasSize>,

    /// Background fill as a hex color.
    #[serde(default = "default_background")]
    pub background: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_background() -> String {
    "#000000".to_string()
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// An empty timeline at 30 fps with no canvas size.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            tracks: Vec::new(),
            fps: default_fps(),
            canvas: None,
            background: default_background(),
        }
    }

    /// Total duration: the latest element end time, or 0 for an empty timeline.
    pub fn duration(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|track| track.elements.iter())
            .map(TimelineElement::end_time)
            .filter(|end| end.is_finite())
            .fold(0.0, f64::max)
    }

    /// Canvas size with the default applied.
    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas.unwrap_or_default()
    }

    /// All elements across all tracks, in compositing order.
    pub fn elements(&self) -> impl Iterator<Item = &TimelineElement> {
        self.tracks.iter().flat_map(|track| track.elements.iter())
    }

    /// Find an element by id (first match across tracks).
    pub fn find_element(&self, id: &str) -> Option<&TimelineElement> {
        self.elements().find(|el| el.id == id)
    }

    /// Append a track and return a mutable reference to it.
    pub fn push_track(&mut self, track: Track) -> &mut Track {
        self.tracks.push(track);
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }
}

/// Kind of media a track holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Image,
}

/// An ordered lane of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub kind: TrackKind,

    #[serde(default)]
    pub elements: Vec<TimelineElement>,

    /// Track gain in `[0.0, 1.0]`.
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Muted tracks are neither heard nor drawn.
    #[serde(default)]
    pub muted: bool,
}

fn default_volume() -> f64 {
    1.0
}

impl Track {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            elements: Vec::new(),
            volume: default_volume(),
            muted: false,
        }
    }

    pub fn with_element(mut self, element: TimelineElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Elements whose interval contains `time_secs`, in insertion order.
    pub fn active_at(&self, time_secs: f64) -> impl Iterator<Item = &TimelineElement> {
        self.elements
            .iter()
            .filter(move |el| el.is_active_at(time_secs))
    }
}

/// Element type tag. Anything unrecognized deserializes to `Unknown`
/// so validation can report it against the element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Video,
    Audio,
    Text,
    Image,
    #[serde(other)]
    Unknown,
}

impl ElementKind {
    /// Whether elements of this kind draw pixels.
    pub fn is_visual(self) -> bool {
        matches!(self, Self::Video | Self::Text | Self::Image)
    }

    /// Whether elements of this kind reference a media item.
    pub fn needs_media(self) -> bool {
        matches!(self, Self::Video | Self::Audio | Self::Image)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

/// A clip placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineElement {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Start on the timeline (seconds).
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: f64,

    /// Visible length on the timeline (seconds).
    pub duration: f64,

    /// Seconds trimmed from the head of the source media.
    #[serde(default, rename = "trimStart", alias = "trim_start")]
    pub trim_start: f64,

    /// Seconds trimmed from the tail of the source media.
    #[serde(default, rename = "trimEnd", alias = "trim_end")]
    pub trim_end: f64,

    /// Media item reference for video/audio/image elements.
    #[serde(default, rename = "mediaId", alias = "media_id")]
    pub media_id: Option<String>,

    /// Per-element gain in `[0.0, 1.0]`.
    #[serde(default)]
    pub volume: Option<f64>,

    #[serde(default)]
    pub effects: Option<EffectValues>,

    /// Text payload; required for text elements.
    #[serde(default)]
    pub text: Option<TextStyle>,

    /// Explicit placement in canvas pixels.
    #[serde(default)]
    pub transform: Option<Transform>,
}

impl TimelineElement {
    fn base(id: impl Into<String>, kind: ElementKind, start_time: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            start_time,
            duration,
            trim_start: 0.0,
            trim_end: 0.0,
            media_id: None,
            volume: None,
            effects: None,
            text: None,
            transform: None,
        }
    }

    pub fn video(
        id: impl Into<String>,
        media_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        let mut el = Self::base(id, ElementKind::Video, start_time, duration);
        el.media_id = Some(media_id.into());
        el
    }

    pub fn image(
        id: impl Into<String>,
        media_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        let mut el = Self::base(id, ElementKind::Image, start_time, duration);
        el.media_id = Some(media_id.into());
        el
    }

    pub fn audio(
        id: impl Into<String>,
        media_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        let mut el = Self::base(id, ElementKind::Audio, start_time, duration);
        el.media_id = Some(media_id.into());
        el
    }

    pub fn text(
        id: impl Into<String>,
        content: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        let mut el = Self::base(id, ElementKind::Text, start_time, duration);
        el.text = Some(TextStyle::new(content));
        el
    }

    pub fn with_effects(mut self, effects: EffectValues) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_trim(mut self, trim_start: f64, trim_end: f64) -> Self {
        self.trim_start = trim_start;
        self.trim_end = trim_end;
        self
    }

    /// End time on the timeline (exclusive).
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Half-open interval test: `[start, start + duration)`.
    pub fn is_active_at(&self, time_secs: f64) -> bool {
        time_secs >= self.start_time && time_secs < self.end_time()
    }

    /// Map a timeline time to a time inside the source media.
    pub fn source_time_at(&self, time_secs: f64) -> f64 {
        (time_secs - self.start_time + self.trim_start).max(0.0)
    }

    /// Effective opacity in `[0.0, 1.0]`.
    pub fn opacity(&self) -> f64 {
        self.effects
            .map(|fx| (fx.opacity / 100.0).clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }

    /// Effective blur radius in pixels.
    pub fn blur(&self) -> f64 {
        self.effects.map(|fx| fx.blur.max(0.0)).unwrap_or(0.0)
    }
}

/// Per-element visual effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectValues {
    /// Gaussian blur sigma in pixels, `>= 0`.
    #[serde(default)]
    pub blur: f64,

    /// Opacity percentage in `[0, 100]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    100.0
}

impl Default for EffectValues {
    fn default() -> Self {
        Self {
            blur: 0.0,
            opacity: default_opacity(),
        }
    }
}

/// Horizontal anchoring of a text run relative to its x position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Text content and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub content: String,

    #[serde(default = "default_font_family", rename = "fontFamily", alias = "font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size", rename = "fontSize", alias = "font_size")]
    pub font_size: f64,

    /// Hex color.
    #[serde(default = "default_text_color")]
    pub color: String,

    /// Anchor x in canvas pixels; `None` centers horizontally.
    #[serde(default)]
    pub x: Option<f64>,

    /// Top y in canvas pixels; `None` centers vertically.
    #[serde(default)]
    pub y: Option<f64>,

    #[serde(default)]
    pub align: TextAlign,
}

fn default_font_family() -> String {
    "Arial, sans-serif".to_string()
}

fn default_font_size() -> f64 {
    24.0
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

impl TextStyle {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            color: default_text_color(),
            x: None,
            y: None,
            align: TextAlign::default(),
        }
    }
}

/// Explicit placement of an element on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the element center.
    #[serde(default)]
    pub rotation: f64,
}

/// An RGBA color parsed from hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(input: &str) -> Option<Color> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Color {
                    r: out[0],
                    g: out[1],
                    b: out[2],
                    a: 255,
                })
            }
            6 => Some(Color {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: 255,
            }),
            8 => Some(Color {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: channel(&hex[6..8])?,
            }),
            _ => None,
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
