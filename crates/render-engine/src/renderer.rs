//! Scene rasterization.
//!
//! [`SceneRenderer::render`] is a pure function of `(scene, frame)` onto a
//! caller-owned [`Surface`]: it clears the surface, then draws every node
//! in order. Each leaf is rasterized at native resolution and gets its blur
//! and opacity in one pass. It is then clipped to the surface, scaled or
//! warped, and composited.

use std::io::Cursor;

use base64::Engine as _;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::timeline::{CanvasSize, Color, TextAlign};

use crate::scene::{Geometry, Paint, Payload, SceneGraph, SceneNode, TextRun};

/// Prefix of every raster payload handed to the recorder.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// An owned RGBA drawing target.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// A transparent surface; zero dimensions are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    /// Surface sized to a project canvas, defaulting to 600x320.
    pub fn for_canvas(canvas: Option<CanvasSize>) -> Self {
        let canvas = canvas.unwrap_or_default();
        Self::new(canvas.width, canvas.height)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn clear(&mut self, color: Color) {
        let fill = Rgba(color.to_rgba());
        for px in self.image.pixels_mut() {
            *px = fill;
        }
    }

    pub fn to_png(&self) -> ReelcutResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ReelcutError::render(format!("PNG encoding failed: {e}")))?;
        Ok(bytes)
    }

    /// `data:image/png;base64,...` for the current pixels.
    pub fn to_data_url(&self) -> ReelcutResult<String> {
        let png = self.to_png()?;
        let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
        url.push_str(PNG_DATA_URL_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(&png, &mut url);
        Ok(url)
    }
}

/// Draws scene graphs onto surfaces.
#[derive(Debug, Clone, Copy)]
pub struct SceneRenderer {
    fps: u32,
}

impl SceneRenderer {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Rasterize `scene` onto `surface`.
    ///
    /// Scene geometry is in canvas pixels and is scaled to the surface size.
    pub fn render(&self, scene: &SceneGraph, frame_index: u64, surface: &mut Surface) {
        let expected = reelcut_common::clock::frame_time_secs(frame_index, self.fps);
        let half_frame = 0.5 / self.fps as f64;
        if (scene.time_secs - expected).abs() > half_frame {
            tracing::debug!(
                frame = frame_index,
                scene_time = scene.time_secs,
                expected_time = expected,
                "Scene timestamp does not match frame index"
            );
        }

        surface.clear(scene.background);
        let scale = (
            surface.width() as f64 / scene.width.max(1) as f64,
            surface.height() as f64 / scene.height.max(1) as f64,
        );
        for node in &scene.root {
            draw_node(node, scale, surface);
        }
    }
}

fn draw_node(node: &SceneNode, scale: (f64, f64), surface: &mut Surface) {
    let native = match &node.payload {
        Payload::Group(children) => {
            for child in children {
                draw_node(child, scale, surface);
            }
            return;
        }
        Payload::Missing { reason } => {
            tracing::debug!(element = %node.element_id, reason = %reason, "Skipping element");
            return;
        }
        Payload::Raster(image) => image.as_ref().clone(),
        Payload::Text(run) => rasterize_text(run),
    };

    let affected = apply_paint(native, node.paint);
    let Some((placed, x, y)) = place(affected, &node.geometry, scale, surface.image.dimensions())
    else {
        return;
    };
    imageops::overlay(&mut surface.image, &placed, x, y);
}

/// Blur then opacity, as a single effect pass on the native raster.
fn apply_paint(image: RgbaImage, paint: Paint) -> RgbaImage {
    let mut out = if paint.blur > 0.0 {
        imageproc::filter::gaussian_blur_f32(&image, paint.blur)
    } else {
        image
    };

    let opacity = paint.opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        for px in out.pixels_mut() {
            px.0[3] = (px.0[3] as f32 * opacity).round() as u8;
        }
    }
    out
}

/// Size and position `image` for the node's geometry.
///
/// Returns the raster and its top-left corner on the surface, or `None`
/// when nothing is visible. The returned raster never exceeds the larger
/// of the surface and the input.
fn place(
    image: RgbaImage,
    geometry: &Geometry,
    scale: (f64, f64),
    surface: (u32, u32),
) -> Option<(RgbaImage, i64, i64)> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let x = (geometry.x * scale.0).round();
    let y = (geometry.y * scale.1).round();
    let width = (geometry.width * scale.0).round();
    let height = (geometry.height * scale.1).round();
    let finite = [x, y, width, height].iter().all(|v| v.is_finite());
    if !finite || width < 1.0 || height < 1.0 {
        return None;
    }
    let dest = Rect {
        x,
        y,
        width,
        height,
    };

    if geometry.rotation.rem_euclid(360.0) == 0.0 {
        place_axis_aligned(image, dest, surface)
    } else {
        let layer = place_rotated(image, dest, geometry.rotation, surface);
        Some((layer, 0, 0))
    }
}

/// Destination rectangle in surface pixels, already rounded.
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn place_axis_aligned(
    image: RgbaImage,
    dest: Rect,
    surface: (u32, u32),
) -> Option<(RgbaImage, i64, i64)> {
    let left = dest.x.max(0.0);
    let top = dest.y.max(0.0);
    let right = (dest.x + dest.width).min(surface.0 as f64);
    let bottom = (dest.y + dest.height).min(surface.1 as f64);
    if right <= left || bottom <= top {
        return None;
    }
    let (visible_w, visible_h) = ((right - left) as u32, (bottom - top) as u32);
    if visible_w == 0 || visible_h == 0 {
        return None;
    }

    let fully_visible = left == dest.x
        && top == dest.y
        && right == dest.x + dest.width
        && bottom == dest.y + dest.height;
    let source = if fully_visible {
        image
    } else {
        // Only the part of the source that lands on the surface.
        let (native_w, native_h) = (image.width() as f64, image.height() as f64);
        let x0 = ((left - dest.x) / dest.width * native_w).floor();
        let y0 = ((top - dest.y) / dest.height * native_h).floor();
        let x1 = ((right - dest.x) / dest.width * native_w).ceil().min(native_w);
        let y1 = ((bottom - dest.y) / dest.height * native_h).ceil().min(native_h);
        let (x0, y0) = (x0.clamp(0.0, native_w - 1.0), y0.clamp(0.0, native_h - 1.0));
        let crop_w = (x1 - x0).max(1.0) as u32;
        let crop_h = (y1 - y0).max(1.0) as u32;
        imageops::crop_imm(&image, x0 as u32, y0 as u32, crop_w, crop_h).to_image()
    };

    let sized = if source.dimensions() == (visible_w, visible_h) {
        source
    } else {
        imageops::resize(&source, visible_w, visible_h, FilterType::Triangle)
    };
    Some((sized, left as i64, top as i64))
}

/// Warp `image` into a transparent, surface-sized layer.
fn place_rotated(image: RgbaImage, dest: Rect, rotation: f64, surface: (u32, u32)) -> RgbaImage {
    // Shrink first when the target is smaller than the source.
    let source = if dest.width < image.width() as f64 || dest.height < image.height() as f64 {
        let w = dest.width.min(image.width() as f64).max(1.0) as u32;
        let h = dest.height.min(image.height() as f64).max(1.0) as u32;
        imageops::resize(&image, w, h, FilterType::Triangle)
    } else {
        image
    };

    let center_x = (dest.x + dest.width / 2.0) as f32;
    let center_y = (dest.y + dest.height / 2.0) as f32;
    let projection = Projection::translate(center_x, center_y)
        * Projection::rotate(rotation.to_radians() as f32)
        * Projection::translate(-(dest.width / 2.0) as f32, -(dest.height / 2.0) as f32)
        * Projection::scale(
            (dest.width / source.width() as f64) as f32,
            (dest.height / source.height() as f64) as f32,
        );

    let mut layer = RgbaImage::new(surface.0, surface.1);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut layer,
    );
    layer
}

fn rasterize_text(run: &TextRun) -> RgbaImage {
    let (width, height) = run.measure();
    let mut canvas = RgbaImage::new(width, height);
    let color = Rgba(run.color.to_rgba());
    let line_height = run.line_height();

    for (i, (line, line_width)) in run.lines.iter().zip(run.line_widths()).enumerate() {
        let x = match run.align {
            TextAlign::Left => 0,
            TextAlign::Center => (width.saturating_sub(line_width) / 2) as i32,
            TextAlign::Right => width.saturating_sub(line_width) as i32,
        };
        let y = (i as f32 * line_height).round() as i32;
        if y >= height as i32 {
            break;
        }
        imageproc::drawing::draw_text_mut(&mut canvas, color, x, y, run.size_px, &run.font, line);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn raster_node(id: &str, color: [u8; 4], geometry: Geometry, paint: Paint) -> SceneNode {
        SceneNode {
            element_id: id.to_string(),
            geometry,
            paint,
            payload: Payload::Raster(Arc::new(RgbaImage::from_pixel(10, 10, Rgba(color)))),
        }
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Geometry {
        Geometry {
            x,
            y,
            width: w,
            height: h,
            rotation: 0.0,
        }
    }

    fn scene(nodes: Vec<SceneNode>) -> SceneGraph {
        let mut scene = SceneGraph::empty(0.0, CanvasSize::new(100, 50), Color::BLACK);
        scene.root = nodes;
        scene
    }

    #[test]
    fn test_surface_defaults_to_600_by_320() {
        let surface = Surface::for_canvas(None);
        assert_eq!((surface.width(), surface.height()), (600, 320));
    }

    #[test]
    fn test_clears_to_background() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        renderer.render(&scene(vec![]), 0, &mut surface);
        assert_eq!(surface.image().get_pixel(50, 25), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_later_nodes_draw_on_top() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let nodes = vec![
            raster_node("red", [255, 0, 0, 255], rect(0.0, 0.0, 60.0, 50.0), Paint::default()),
            raster_node("blue", [0, 0, 255, 255], rect(40.0, 0.0, 60.0, 50.0), Paint::default()),
        ];
        renderer.render(&scene(nodes), 0, &mut surface);
        assert_eq!(surface.image().get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.image().get_pixel(50, 10), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_geometry_scales_to_surface() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(200, 100);
        let nodes = vec![raster_node(
            "white",
            [255, 255, 255, 255],
            rect(50.0, 25.0, 50.0, 25.0),
            Paint::default(),
        )];
        renderer.render(&scene(nodes), 0, &mut surface);
        // Canvas (50,25)-(100,50) maps to surface (100,50)-(200,100).
        assert_eq!(surface.image().get_pixel(150, 75), &Rgba([255, 255, 255, 255]));
        assert_eq!(surface.image().get_pixel(90, 75), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_opacity_blends_with_background() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let nodes = vec![raster_node(
            "half",
            [255, 255, 255, 255],
            rect(0.0, 0.0, 100.0, 50.0),
            Paint {
                opacity: 0.5,
                blur: 0.0,
            },
        )];
        renderer.render(&scene(nodes), 0, &mut surface);
        let px = surface.image().get_pixel(50, 25);
        assert!(px.0[0] > 100 && px.0[0] < 160, "got {:?}", px);
    }

    #[test]
    fn test_missing_payload_renders_nothing() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let nodes = vec![SceneNode {
            element_id: "gone".to_string(),
            geometry: rect(0.0, 0.0, 100.0, 50.0),
            paint: Paint::default(),
            payload: Payload::Missing {
                reason: "decode failed".to_string(),
            },
        }];
        renderer.render(&scene(nodes), 0, &mut surface);
        assert!(surface.image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_render_is_idempotent() {
        let renderer = SceneRenderer::new(30);
        let nodes = vec![
            raster_node("a", [10, 200, 30, 255], rect(5.0, 5.0, 40.0, 30.0), Paint { opacity: 0.7, blur: 2.0 }),
            SceneNode {
                element_id: "b".to_string(),
                geometry: Geometry {
                    rotation: 30.0,
                    ..rect(30.0, 10.0, 40.0, 20.0)
                },
                paint: Paint::default(),
                payload: Payload::Raster(Arc::new(RgbaImage::from_pixel(8, 4, Rgba([200, 10, 10, 255])))),
            },
        ];
        let scene = scene(nodes);

        let mut first = Surface::new(100, 50);
        let mut second = Surface::new(100, 50);
        renderer.render(&scene, 3, &mut first);
        renderer.render(&scene, 3, &mut second);
        // Rendering onto a dirty surface must give the same pixels.
        renderer.render(&scene, 3, &mut second);
        assert_eq!(first.to_png().unwrap(), second.to_png().unwrap());
    }

    #[test]
    fn test_partially_visible_node_is_clipped() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let mut halves = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        halves.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let nodes = vec![SceneNode {
            element_id: "wide".to_string(),
            geometry: rect(-100.0, 0.0, 200.0, 50.0),
            paint: Paint::default(),
            payload: Payload::Raster(Arc::new(halves)),
        }];
        renderer.render(&scene(nodes), 0, &mut surface);
        // Only the right half lands on the surface.
        assert_eq!(surface.image().get_pixel(5, 25), &Rgba([0, 0, 255, 255]));
        assert_eq!(surface.image().get_pixel(95, 25), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_huge_geometry_fills_surface_without_large_buffers() {
        let renderer = SceneRenderer::new(30);
        let huge = rect(-1.0e12, -1.0e12, 2.0e12 + 100.0, 2.0e12 + 50.0);
        for rotation in [0.0, 45.0] {
            let mut surface = Surface::new(64, 36);
            let nodes = vec![raster_node(
                "huge",
                [255, 0, 0, 255],
                Geometry { rotation, ..huge },
                Paint::default(),
            )];
            renderer.render(&scene(nodes), 0, &mut surface);
            assert_eq!(
                surface.image().get_pixel(32, 18),
                &Rgba([255, 0, 0, 255]),
                "rotation {rotation}"
            );
        }
    }

    #[test]
    fn test_offscreen_node_draws_nothing() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let nodes = vec![raster_node(
            "away",
            [255, 255, 255, 255],
            rect(1.0e9, 1.0e9, 1.0e9, 1.0e9),
            Paint::default(),
        )];
        renderer.render(&scene(nodes), 0, &mut surface);
        assert!(surface.image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_rotated_node_covers_its_center() {
        let renderer = SceneRenderer::new(30);
        let mut surface = Surface::new(100, 50);
        let nodes = vec![raster_node(
            "turned",
            [255, 255, 255, 255],
            Geometry {
                rotation: 90.0,
                ..rect(25.0, 0.0, 50.0, 50.0)
            },
            Paint::default(),
        )];
        renderer.render(&scene(nodes), 0, &mut surface);
        assert_eq!(surface.image().get_pixel(50, 25), &Rgba([255, 255, 255, 255]));
        assert_eq!(surface.image().get_pixel(5, 25), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_data_url_prefix() {
        let url = Surface::new(2, 2).to_data_url().unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert!(url.len() > PNG_DATA_URL_PREFIX.len());
    }
}
