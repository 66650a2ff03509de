//! Per-frame scene graph.
//!
//! A [`SceneGraph`] is a snapshot of what to draw at one timestamp. It is
//! built from the timeline in canvas coordinates, handed to the renderer,
//! and dropped. Nothing in it refers back to the timeline.

use std::fmt;
use std::sync::Arc;

use ab_glyph::FontArc;
use image::RgbaImage;
use reelcut_project_model::timeline::{
    CanvasSize, Color, ElementKind, TextAlign, TextStyle, Timeline, TimelineElement,
};

use crate::media::MediaSource;
use crate::validate::MAX_FONT_SIZE;

/// Line spacing as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Largest side of a rasterized text block; text beyond it is cut off.
pub const MAX_TEXT_RASTER_SIDE: u32 = 4096;

/// Everything to draw for one output frame.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// Timestamp this scene was built for.
    pub time_secs: f64,
    /// Canvas width the geometry is expressed in.
    pub width: u32,
    /// Canvas height the geometry is expressed in.
    pub height: u32,
    pub background: Color,
    /// Top-level nodes, bottom first.
    pub root: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn empty(time_secs: f64, canvas: CanvasSize, background: Color) -> Self {
        Self {
            time_secs,
            width: canvas.width,
            height: canvas.height,
            background,
            root: Vec::new(),
        }
    }

    /// Number of leaf nodes, including missing ones.
    pub fn leaf_count(&self) -> usize {
        fn count(nodes: &[SceneNode]) -> usize {
            nodes
                .iter()
                .map(|n| match &n.payload {
                    Payload::Group(children) => count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.root)
    }
}

/// Placement in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise degrees about the center.
    pub rotation: f64,
}

impl Geometry {
    pub fn full(canvas: CanvasSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: canvas.width as f64,
            height: canvas.height as f64,
            rotation: 0.0,
        }
    }
}

/// Per-node effects, applied as one pass after rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// `[0.0, 1.0]`
    pub opacity: f32,
    /// Gaussian sigma in canvas pixels.
    pub blur: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blur: 0.0,
        }
    }
}

/// A laid-out block of text.
#[derive(Clone)]
pub struct TextRun {
    pub lines: Vec<String>,
    pub font: FontArc,
    /// Font size in canvas pixels.
    pub size_px: f32,
    pub color: Color,
    pub align: TextAlign,
}

impl fmt::Debug for TextRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRun")
            .field("lines", &self.lines)
            .field("size_px", &self.size_px)
            .field("color", &self.color)
            .field("align", &self.align)
            .finish_non_exhaustive()
    }
}

impl TextRun {
    /// Width of each line in pixels at `size_px`.
    pub fn line_widths(&self) -> Vec<u32> {
        self.lines
            .iter()
            .map(|line| imageproc::drawing::text_size(self.size_px, &self.font, line).0)
            .collect()
    }

    pub fn line_height(&self) -> f32 {
        self.size_px * LINE_HEIGHT
    }

    /// Bounding box `(width, height)` of the whole block, capped at
    /// [`MAX_TEXT_RASTER_SIDE`] per side.
    pub fn measure(&self) -> (u32, u32) {
        let width = self.line_widths().into_iter().max().unwrap_or(0);
        let height = (self.line_height() * self.lines.len() as f32).ceil() as u32;
        (
            width.clamp(1, MAX_TEXT_RASTER_SIDE),
            height.clamp(1, MAX_TEXT_RASTER_SIDE),
        )
    }
}

/// What a node draws.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Decoded image or video frame at native resolution.
    Raster(Arc<RgbaImage>),
    Text(TextRun),
    Group(Vec<SceneNode>),
    /// Source could not be produced for this frame; drawn as nothing.
    Missing { reason: String },
}

/// One drawable unit.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Timeline element (or track, for groups) this node came from.
    pub element_id: String,
    pub geometry: Geometry,
    pub paint: Paint,
    pub payload: Payload,
}

impl SceneNode {
    pub fn is_missing(&self) -> bool {
        matches!(self.payload, Payload::Missing { .. })
    }
}

/// Projects a timeline into a [`SceneGraph`] at a given time.
pub struct SceneBuilder<'a> {
    media: &'a dyn MediaSource,
    font: Option<FontArc>,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(media: &'a dyn MediaSource, font: Option<FontArc>) -> Self {
        Self { media, font }
    }

    /// Build the scene for `time_secs`.
    ///
    /// Each non-muted, non-audio track becomes a group in track order; its
    /// children are the elements active at `time_secs` in insertion order.
    pub fn build(&self, timeline: &Timeline, time_secs: f64) -> SceneGraph {
        let canvas = timeline.canvas_size();
        let background = Color::parse_hex(&timeline.background).unwrap_or(Color::BLACK);
        let mut scene = SceneGraph::empty(time_secs, canvas, background);

        for track in &timeline.tracks {
            if track.muted {
                continue;
            }
            let children: Vec<SceneNode> = track
                .active_at(time_secs)
                .filter(|el| el.kind.is_visual())
                .map(|el| self.build_element(el, canvas, time_secs))
                .collect();
            if children.is_empty() {
                continue;
            }
            scene.root.push(SceneNode {
                element_id: track.id.clone(),
                geometry: Geometry::full(canvas),
                paint: Paint::default(),
                payload: Payload::Group(children),
            });
        }

        scene
    }

    fn build_element(&self, element: &TimelineElement, canvas: CanvasSize, time_secs: f64) -> SceneNode {
        let paint = Paint {
            opacity: element.opacity() as f32,
            blur: element.blur() as f32,
        };
        let (geometry, payload) = match element.kind {
            ElementKind::Video | ElementKind::Image => self.media_node(element, canvas, time_secs),
            ElementKind::Text => self.text_node(element, canvas),
            ElementKind::Audio | ElementKind::Unknown => (
                Geometry::full(canvas),
                Payload::Missing {
                    reason: format!("{} elements are not drawn", element.kind.as_str()),
                },
            ),
        };

        SceneNode {
            element_id: element.id.clone(),
            geometry,
            paint,
            payload,
        }
    }

    fn media_node(&self, element: &TimelineElement, canvas: CanvasSize, time_secs: f64) -> (Geometry, Payload) {
        let fallback = Geometry::full(canvas);
        let Some(media_id) = element.media_id.as_deref() else {
            return (
                fallback,
                Payload::Missing {
                    reason: "no media reference".to_string(),
                },
            );
        };

        let source_time = element.source_time_at(time_secs);
        match self.media.frame_at(media_id, source_time) {
            Ok(frame) => {
                let geometry = match element.transform {
                    Some(t) => Geometry {
                        x: t.x,
                        y: t.y,
                        width: t.width,
                        height: t.height,
                        rotation: t.rotation,
                    },
                    None => contain(frame.width(), frame.height(), canvas),
                };
                (geometry, Payload::Raster(frame))
            }
            Err(err) => {
                tracing::debug!(
                    element = %element.id,
                    media = media_id,
                    time = source_time,
                    error = %err,
                    "Media unavailable for frame"
                );
                (
                    fallback,
                    Payload::Missing {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }

    fn text_node(&self, element: &TimelineElement, canvas: CanvasSize) -> (Geometry, Payload) {
        let fallback = Geometry::full(canvas);
        let Some(style) = element.text.as_ref() else {
            return (
                fallback,
                Payload::Missing {
                    reason: "text element has no text".to_string(),
                },
            );
        };
        let Some(font) = self.font.clone() else {
            return (
                fallback,
                Payload::Missing {
                    reason: "no font available".to_string(),
                },
            );
        };

        let run = TextRun {
            lines: style.content.lines().map(str::to_string).collect(),
            font,
            size_px: style.font_size.clamp(1.0, MAX_FONT_SIZE) as f32,
            color: Color::parse_hex(&style.color).unwrap_or(Color::WHITE),
            align: style.align,
        };
        if run.lines.is_empty() {
            return (
                fallback,
                Payload::Missing {
                    reason: "text is empty".to_string(),
                },
            );
        }

        let (w, h) = run.measure();
        let rotation = element.transform.map(|t| t.rotation).unwrap_or(0.0);
        let (x, y) = place_text(style, w as f64, h as f64, canvas);
        (
            Geometry {
                x,
                y,
                width: w as f64,
                height: h as f64,
                rotation,
            },
            Payload::Text(run),
        )
    }
}

/// Largest rect with the source aspect ratio that fits the canvas, centered.
pub fn contain(src_w: u32, src_h: u32, canvas: CanvasSize) -> Geometry {
    let (cw, ch) = (canvas.width as f64, canvas.height as f64);
    if src_w == 0 || src_h == 0 {
        return Geometry::full(canvas);
    }
    let scale = (cw / src_w as f64).min(ch / src_h as f64);
    let width = src_w as f64 * scale;
    let height = src_h as f64 * scale;
    Geometry {
        x: (cw - width) / 2.0,
        y: (ch - height) / 2.0,
        width,
        height,
        rotation: 0.0,
    }
}

/// Top-left of a text block of `w`x`h`.
fn place_text(style: &TextStyle, w: f64, h: f64, canvas: CanvasSize) -> (f64, f64) {
    let x = match style.x {
        None => (canvas.width as f64 - w) / 2.0,
        Some(anchor) => match style.align {
            TextAlign::Left => anchor,
            TextAlign::Center => anchor - w / 2.0,
            TextAlign::Right => anchor - w,
        },
    };
    let y = style.y.unwrap_or((canvas.height as f64 - h) / 2.0);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{EmptyMediaSource, MediaLibrary};
    use image::Rgba;
    use reelcut_project_model::timeline::{Track, TrackKind, Transform};

    fn library() -> MediaLibrary {
        let mut lib = MediaLibrary::new("ffmpeg");
        lib.insert_still("wide", RgbaImage::from_pixel(200, 100, Rgba([255, 0, 0, 255])));
        lib
    }

    #[test]
    fn test_contain_fit_centers() {
        let g = contain(200, 100, CanvasSize::new(600, 320));
        assert!((g.width - 600.0).abs() < 1e-9);
        assert!((g.height - 300.0).abs() < 1e-9);
        assert!((g.y - 10.0).abs() < 1e-9);
        assert_eq!(g.x, 0.0);
    }

    #[test]
    fn test_build_orders_tracks_and_skips_inactive() {
        let lib = library();
        let mut timeline = Timeline::new();
        timeline.push_track(
            Track::new("bottom", TrackKind::Image)
                .with_element(TimelineElement::image("a", "wide", 0.0, 1.0))
                .with_element(TimelineElement::image("late", "wide", 5.0, 1.0)),
        );
        timeline.push_track(
            Track::new("top", TrackKind::Image)
                .with_element(TimelineElement::image("b", "wide", 0.0, 2.0)),
        );

        let scene = SceneBuilder::new(&lib, None).build(&timeline, 0.5);
        let ids: Vec<_> = scene.root.iter().map(|n| n.element_id.as_str()).collect();
        assert_eq!(ids, ["bottom", "top"]);
        assert_eq!(scene.leaf_count(), 2);
    }

    #[test]
    fn test_muted_and_audio_tracks_are_skipped() {
        let lib = library();
        let mut timeline = Timeline::new();
        let mut muted = Track::new("m", TrackKind::Image)
            .with_element(TimelineElement::image("a", "wide", 0.0, 1.0));
        muted.muted = true;
        timeline.push_track(muted);
        timeline.push_track(
            Track::new("aud", TrackKind::Audio)
                .with_element(TimelineElement::audio("s", "song", 0.0, 1.0)),
        );

        let scene = SceneBuilder::new(&lib, None).build(&timeline, 0.0);
        assert!(scene.root.is_empty());
    }

    #[test]
    fn test_unavailable_media_becomes_missing() {
        let mut timeline = Timeline::new();
        timeline.push_track(
            Track::new("v", TrackKind::Video)
                .with_element(TimelineElement::video("clip", "absent", 0.0, 1.0)),
        );
        let scene = SceneBuilder::new(&EmptyMediaSource, None).build(&timeline, 0.0);
        let Payload::Group(children) = &scene.root[0].payload else {
            panic!("expected group");
        };
        assert!(children[0].is_missing());
    }

    #[test]
    fn test_text_without_font_is_missing() {
        let mut timeline = Timeline::new();
        timeline.push_track(
            Track::new("t", TrackKind::Text)
                .with_element(TimelineElement::text("title", "Hello", 0.0, 1.0)),
        );
        let scene = SceneBuilder::new(&EmptyMediaSource, None).build(&timeline, 0.0);
        let Payload::Group(children) = &scene.root[0].payload else {
            panic!("expected group");
        };
        assert!(matches!(&children[0].payload, Payload::Missing { reason } if reason.contains("font")));
    }

    #[test]
    fn test_transform_overrides_fit() {
        let lib = library();
        let mut timeline = Timeline::new();
        timeline.push_track(Track::new("i", TrackKind::Image).with_element(
            TimelineElement::image("a", "wide", 0.0, 1.0).with_transform(Transform {
                x: 10.0,
                y: 20.0,
                width: 50.0,
                height: 40.0,
                rotation: 90.0,
            }),
        ));
        let scene = SceneBuilder::new(&lib, None).build(&timeline, 0.0);
        let Payload::Group(children) = &scene.root[0].payload else {
            panic!("expected group");
        };
        assert_eq!(children[0].geometry.x, 10.0);
        assert_eq!(children[0].geometry.rotation, 90.0);
    }

    #[test]
    fn test_place_text_alignment() {
        let canvas = CanvasSize::new(600, 320);
        let mut style = TextStyle::new("x");
        assert_eq!(place_text(&style, 100.0, 20.0, canvas), (250.0, 150.0));

        style.x = Some(300.0);
        style.y = Some(10.0);
        style.align = TextAlign::Right;
        assert_eq!(place_text(&style, 100.0, 20.0, canvas), (200.0, 10.0));
        style.align = TextAlign::Left;
        assert_eq!(place_text(&style, 100.0, 20.0, canvas), (300.0, 10.0));
    }
}
