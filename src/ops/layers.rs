// ============================================================================
// LAYER COMPOSITE — ordered compositing of the layer stack over the frame
// ============================================================================
//
// Layers are drawn strictly in array order (bottom to top); each image
// reference is resolved through the `LayerAssets` provider before its draw
// and before moving on to the next layer, so two layers can never land out
// of order. A failed decode skips that layer and compositing continues.
// Opacity and blend mode are per-draw parameters, so nothing bleeds from
// one layer into the next.

use std::collections::HashMap;
use std::path::PathBuf;

use ab_glyph::FontArc;
use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

use crate::ops::{blend, text, transform};
use crate::settings::{BlendMode, Layer, LayerKind};

/// Reference width the original surface designed text sizes against; font
/// sizes scale proportionally to the destination width relative to this.
pub const TEXT_REFERENCE_WIDTH: f32 = 400.0;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset decode failed: {0}")]
    Decode(String),
}

/// Resolves opaque layer content references into pixels, and optionally
/// supplies the font used for text layers. Provided by the embedding
/// application; the engine itself stays free of I/O policy.
pub trait LayerAssets {
    fn load_image(&self, reference: &str) -> Result<RgbaImage, AssetError>;

    fn font(&self) -> Option<&FontArc> {
        None
    }
}

/// Provider that resolves nothing. Image layers are skipped, text layers
/// have no font.
#[derive(Default)]
pub struct NoAssets;

impl LayerAssets for NoAssets {
    fn load_image(&self, reference: &str) -> Result<RgbaImage, AssetError> {
        Err(AssetError::NotFound(reference.to_string()))
    }
}

/// Provider reading image references as paths relative to a base directory.
pub struct FileAssets {
    base: PathBuf,
    font: Option<FontArc>,
}

impl FileAssets {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }
}

impl LayerAssets for FileAssets {
    fn load_image(&self, reference: &str) -> Result<RgbaImage, AssetError> {
        let path = self.base.join(reference);
        let img = image::open(&path).map_err(|e| match e {
            image::ImageError::IoError(_) => AssetError::NotFound(path.display().to_string()),
            other => AssetError::Decode(other.to_string()),
        })?;
        Ok(img.to_rgba8())
    }

    fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }
}

/// In-memory provider, used by tests and by callers that decode elsewhere.
#[derive(Default)]
pub struct MemoryAssets {
    images: HashMap<String, RgbaImage>,
    font: Option<FontArc>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, image: RgbaImage) {
        self.images.insert(reference.to_string(), image);
    }

    pub fn set_font(&mut self, font: FontArc) {
        self.font = Some(font);
    }
}

impl LayerAssets for MemoryAssets {
    fn load_image(&self, reference: &str) -> Result<RgbaImage, AssetError> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(reference.to_string()))
    }

    fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Unparseable strings fall back to
/// opaque white, the default layer text color.
pub fn parse_hex_color(s: &str) -> Rgba<u8> {
    let hex = s.trim().trim_start_matches('#');
    let parse2 = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let parse1 = |i: usize| {
        u8::from_str_radix(&hex[i..i + 1], 16)
            .ok()
            .map(|v| v * 16 + v)
    };

    let parsed = match hex.len() {
        3 => match (parse1(0), parse1(1), parse1(2)) {
            (Some(r), Some(g), Some(b)) => Some(Rgba([r, g, b, 255])),
            _ => None,
        },
        6 => match (parse2(0), parse2(2), parse2(4)) {
            (Some(r), Some(g), Some(b)) => Some(Rgba([r, g, b, 255])),
            _ => None,
        },
        8 => match (parse2(0), parse2(2), parse2(4), parse2(6)) {
            (Some(r), Some(g), Some(b), Some(a)) => Some(Rgba([r, g, b, a])),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or(Rgba([255, 255, 255, 255]))
}

/// Composite the layer stack over `dest` in array order.
pub fn composite_layers(dest: &mut RgbaImage, layers: &[Layer], assets: &dyn LayerAssets) {
    let dw = dest.width() as f32;
    let dh = dest.height() as f32;
    if dw < 1.0 || dh < 1.0 {
        return;
    }

    for layer in layers {
        if !layer.visible {
            continue;
        }

        let opacity = (layer.opacity / 100.0).clamp(0.0, 1.0);
        if opacity <= 0.0 {
            continue;
        }
        let lx = layer.x / 100.0 * dw;
        let ly = layer.y / 100.0 * dh;

        match &layer.kind {
            LayerKind::Text {
                content,
                font_size,
                color,
            } => {
                let Some(font) = assets.font() else {
                    log::warn!("text layer '{}' skipped: no font available", layer.name);
                    continue;
                };
                let font_scale = dw / TEXT_REFERENCE_WIDTH;
                let px = (font_size * font_scale).round().max(1.0);
                text::draw_text_centered(
                    dest,
                    font,
                    content,
                    px,
                    parse_hex_color(color),
                    lx,
                    ly,
                    layer.blend_mode,
                    opacity,
                );
            }
            LayerKind::Image { content } => {
                let img = match assets.load_image(content) {
                    Ok(img) => img,
                    Err(e) => {
                        log::warn!("image layer '{}' skipped: {e}", layer.name);
                        continue;
                    }
                };
                if img.width() == 0 || img.height() == 0 {
                    continue;
                }
                // Larger dimension becomes scale * destWidth/3, aspect kept.
                let size = (layer.scale.max(0.0)) * (dw / 3.0);
                if size < 1.0 {
                    continue;
                }
                let aspect = img.width() as f32 / img.height() as f32;
                let (lw, lh) = if aspect >= 1.0 {
                    (size, size / aspect)
                } else {
                    (size * aspect, size)
                };
                let lw_px = (lw.round() as u32).max(1);
                let lh_px = (lh.round() as u32).max(1);
                let scaled = if (lw_px, lh_px) == img.dimensions() {
                    img
                } else {
                    imageops::resize(&img, lw_px, lh_px, imageops::FilterType::Triangle)
                };
                draw_image_centered(
                    dest,
                    &scaled,
                    lx,
                    ly,
                    layer.rotation,
                    layer.blend_mode,
                    opacity,
                );
            }
            LayerKind::Shape | LayerKind::Adjustment => {
                log::debug!("layer '{}' has no raster form yet, skipped", layer.name);
            }
        }
    }
}

/// Draw `img` centered on `(cx, cy)`, rotated about its own center, blended
/// into `dest`.
fn draw_image_centered(
    dest: &mut RgbaImage,
    img: &RgbaImage,
    cx: f32,
    cy: f32,
    rotation_deg: f32,
    mode: BlendMode,
    opacity: f32,
) {
    let lw = img.width() as f32;
    let lh = img.height() as f32;
    let theta = rotation_deg.to_radians();
    let (sin, cos) = theta.sin_cos();

    // Bounding radius of the rotated rect, clamped to the frame.
    let half_diag = 0.5 * (lw * lw + lh * lh).sqrt();
    let x0 = ((cx - half_diag).floor() as i64).clamp(0, dest.width() as i64) as u32;
    let y0 = ((cy - half_diag).floor() as i64).clamp(0, dest.height() as i64) as u32;
    let x1 = ((cx + half_diag).ceil() as i64).clamp(0, dest.width() as i64) as u32;
    let y1 = ((cy + half_diag).ceil() as i64).clamp(0, dest.height() as i64) as u32;

    for y in y0..y1 {
        let dy = y as f32 + 0.5 - cy;
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            // Un-rotate the destination offset into layer space.
            let ux = dx * cos + dy * sin;
            let uy = -dx * sin + dy * cos;
            let sx = ux + lw / 2.0;
            let sy = uy + lh / 2.0;
            let top = transform::bilinear_sample(img, sx, sy);
            if top[3] == 0 {
                continue;
            }
            let base = *dest.get_pixel(x, y);
            dest.put_pixel(x, y, blend::blend_pixel(base, top, mode, opacity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backdrop() -> RgbaImage {
        RgbaImage::from_pixel(90, 60, Rgba([40, 40, 40, 255]))
    }

    fn red_dot_assets() -> MemoryAssets {
        let mut assets = MemoryAssets::new();
        assets.insert("dot", RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        assets
    }

    #[test]
    fn hex_colors_parse_with_white_fallback() {
        assert_eq!(parse_hex_color("#ff0000"), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_hex_color("#0f0"), Rgba([0, 255, 0, 255]));
        assert_eq!(parse_hex_color("#11223344"), Rgba([17, 34, 51, 68]));
        assert_eq!(parse_hex_color("garbage"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color(""), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn invisible_layers_change_nothing() {
        let mut frame = backdrop();
        let baseline = frame.clone();

        let mut a = Layer::image("A", "dot");
        a.visible = false;
        let mut b = Layer::text("B", "HELLO");
        b.visible = false;

        composite_layers(&mut frame, &[a, b], &red_dot_assets());
        assert_eq!(frame, baseline);
    }

    #[test]
    fn image_layer_draws_centered_at_percent_position() {
        let mut frame = backdrop();
        let layer = Layer::image("dot", "dot");
        composite_layers(&mut frame, std::slice::from_ref(&layer), &red_dot_assets());
        // Default position is (50%, 50%) — the center pixel turns red.
        assert_eq!(frame.get_pixel(45, 30).0, [255, 0, 0, 255]);
        // Far corner is untouched (layer spans destW/3 = 30px).
        assert_eq!(frame.get_pixel(0, 0).0, [40, 40, 40, 255]);
    }

    #[test]
    fn failed_decode_skips_layer_and_continues() {
        let mut frame = backdrop();
        let missing = Layer::image("missing", "nope");
        let present = Layer::image("dot", "dot");
        composite_layers(&mut frame, &[missing, present], &red_dot_assets());
        assert_eq!(frame.get_pixel(45, 30).0, [255, 0, 0, 255]);
    }

    #[test]
    fn text_layer_without_font_is_skipped() {
        let mut frame = backdrop();
        let baseline = frame.clone();
        let layer = Layer::text("caption", "NO FONT HERE");
        composite_layers(&mut frame, std::slice::from_ref(&layer), &NoAssets);
        assert_eq!(frame, baseline);
    }

    #[test]
    fn layer_order_is_bottom_to_top() {
        let mut assets = red_dot_assets();
        assets.insert("blue", RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255])));

        let mut frame = backdrop();
        let bottom = Layer::image("red", "dot");
        let top = Layer::image("blue", "blue");
        composite_layers(&mut frame, &[bottom, top], &assets);
        // The later entry wins at the shared center.
        assert_eq!(frame.get_pixel(45, 30).0, [0, 0, 255, 255]);
    }

    #[test]
    fn opacity_zero_layer_is_a_noop() {
        let mut frame = backdrop();
        let baseline = frame.clone();
        let mut layer = Layer::image("dot", "dot");
        layer.opacity = 0.0;
        composite_layers(&mut frame, std::slice::from_ref(&layer), &red_dot_assets());
        assert_eq!(frame, baseline);
    }

    #[test]
    fn blend_mode_applies_per_layer() {
        let mut frame = RgbaImage::from_pixel(90, 60, Rgba([100, 100, 100, 255]));
        let mut layer = Layer::image("dot", "dot");
        layer.blend_mode = BlendMode::Multiply;
        composite_layers(&mut frame, std::slice::from_ref(&layer), &red_dot_assets());
        // multiply(100, 255) keeps red, multiply(100, 0) zeroes green/blue.
        let px = frame.get_pixel(45, 30);
        assert_eq!(px.0, [100, 0, 0, 255]);
    }
}
