// ============================================================================
// TEXT RASTERIZATION — centered text layers via ab_glyph
// ============================================================================

use ab_glyph::{point, Font, FontArc, Glyph, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::ops::blend;
use crate::settings::BlendMode;

/// Lay out a single line, returning positioned glyphs (left-aligned at
/// x = 0, baseline at y = 0) and the total advance width.
fn layout_line(font: &FontArc, text: &str, font_size: f32) -> (Vec<Glyph>, f32) {
    let scaled = font.as_scaled(font_size);

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push(glyph_id.with_scale_and_position(font_size, point(cursor_x, 0.0)));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

/// Draw one line of text centered (horizontally and vertically) on
/// `(center_x, center_y)`, blended into `dest` with the given mode and
/// layer opacity. Coordinates are destination pixels.
pub fn draw_text_centered(
    dest: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    font_size: f32,
    color: Rgba<u8>,
    center_x: f32,
    center_y: f32,
    mode: BlendMode,
    opacity: f32,
) {
    let font_size = font_size.max(1.0);
    let (glyphs, total_width) = layout_line(font, text, font_size);
    if glyphs.is_empty() {
        return;
    }

    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let descent = scaled.descent();

    let origin_x = center_x - total_width * 0.5;
    // Middle baseline: center the ascent/descent box on center_y.
    let baseline_y = center_y + (ascent + descent) * 0.5;

    let w = dest.width() as i32;
    let h = dest.height() as i32;

    for mut glyph in glyphs {
        glyph.position = point(glyph.position.x + origin_x, glyph.position.y + baseline_y);
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue; // whitespace has no outline
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            if coverage <= 0.001 {
                return;
            }
            let x = bounds.min.x as i32 + gx as i32;
            let y = bounds.min.y as i32 + gy as i32;
            if x < 0 || y < 0 || x >= w || y >= h {
                return;
            }
            let alpha = (color[3] as f32 * coverage).round().min(255.0) as u8;
            let top = Rgba([color[0], color[1], color[2], alpha]);
            let base = *dest.get_pixel(x as u32, y as u32);
            dest.put_pixel(x as u32, y as u32, blend::blend_pixel(base, top, mode, opacity));
        });
    }
}
