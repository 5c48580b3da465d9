// ============================================================================
// TONAL FILTER — the combined color pass of the render pipeline
// ============================================================================
//
// Brightness/exposure, contrast and saturation/vibrance collapse into one
// pointwise color pass, followed by the blur term of the same filter
// expression. The pointwise chain runs in f32 and clamps once at the end,
// so the three color terms interact before quantization.

use image::RgbaImage;
use rayon::prelude::*;

use crate::ops::effects;
use crate::settings::ProjectSettings;

// Rec.709 luminance weights used by the saturation and hue-rotate matrices.
const LUM_R: f32 = 0.213;
const LUM_G: f32 = 0.715;
const LUM_B: f32 = 0.072;

/// Resolved parameters of the combined pass. All factors are normalized
/// (1.0 = neutral) and saturated to non-negative values, so arbitrary
/// out-of-range settings can never panic the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TonalFilter {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub blur_sigma: f32,
}

impl TonalFilter {
    /// Combine the raw settings into effective factors:
    /// brightness and exposure are additive in the same unit, vibrance is a
    /// delta around its own neutral midpoint of 100, contrast passes
    /// through, blur is a pixel radius capped at its nominal 0–50 range.
    pub fn from_settings(s: &ProjectSettings) -> Self {
        Self {
            brightness: ((s.brightness + s.exposure) / 100.0).max(0.0),
            contrast: (s.contrast / 100.0).max(0.0),
            saturation: ((s.saturation + (s.vibrance - 100.0)) / 100.0).max(0.0),
            blur_sigma: s.blur.clamp(0.0, 50.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0
            && self.contrast == 1.0
            && self.saturation == 1.0
            && self.blur_sigma == 0.0
    }

    fn apply_channels(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        // brightness
        let (mut r, mut g, mut b) = (r * self.brightness, g * self.brightness, b * self.brightness);
        // contrast, pivoting on mid-gray
        r = (r - 0.5) * self.contrast + 0.5;
        g = (g - 0.5) * self.contrast + 0.5;
        b = (b - 0.5) * self.contrast + 0.5;
        // saturation
        saturate_channels(r, g, b, self.saturation)
    }
}

/// Run the combined pass over a frame. Alpha is preserved; the blur term
/// (if any) runs after the pointwise chain at the same spatial sampling.
pub fn apply(src: &RgbaImage, filter: &TonalFilter) -> RgbaImage {
    if filter.is_identity() {
        return src.clone();
    }

    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let pointwise = filter.brightness != 1.0 || filter.contrast != 1.0 || filter.saturation != 1.0;
    let colored = if pointwise {
        let src_raw = src.as_raw();
        let stride = w * 4;
        let mut dst_raw = vec![0u8; w * h * 4];

        dst_raw
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row_out)| {
                let row_in = &src_raw[y * stride..(y + 1) * stride];
                for x in 0..w {
                    let pi = x * 4;
                    let r = row_in[pi] as f32 / 255.0;
                    let g = row_in[pi + 1] as f32 / 255.0;
                    let b = row_in[pi + 2] as f32 / 255.0;
                    let (nr, ng, nb) = filter.apply_channels(r, g, b);
                    row_out[pi] = (nr * 255.0).round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 1] = (ng * 255.0).round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 2] = (nb * 255.0).round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 3] = row_in[pi + 3];
                }
            });

        RgbaImage::from_raw(w as u32, h as u32, dst_raw)
            .expect("tonal buffer matches image dimensions")
    } else {
        src.clone()
    };

    if filter.blur_sigma > 0.0 {
        effects::gaussian_blur(&colored, filter.blur_sigma)
    } else {
        colored
    }
}

/// Luminance-preserving saturation matrix (SVG feColorMatrix `saturate`).
fn saturate_channels(r: f32, g: f32, b: f32, s: f32) -> (f32, f32, f32) {
    if s == 1.0 {
        return (r, g, b);
    }
    let inv = 1.0 - s;
    (
        (LUM_R * inv + s) * r + LUM_G * inv * g + LUM_B * inv * b,
        LUM_R * inv * r + (LUM_G * inv + s) * g + LUM_B * inv * b,
        LUM_R * inv * r + LUM_G * inv * g + (LUM_B * inv + s) * b,
    )
}

/// Sepia matrix interpolated toward identity by `1 - amount`.
fn sepia_channels(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    if amount <= 0.0 {
        return (r, g, b);
    }
    let sr = 0.393 * r + 0.769 * g + 0.189 * b;
    let sg = 0.349 * r + 0.686 * g + 0.168 * b;
    let sb = 0.272 * r + 0.534 * g + 0.131 * b;
    let keep = 1.0 - amount;
    (
        r * keep + sr * amount,
        g * keep + sg * amount,
        b * keep + sb * amount,
    )
}

/// SVG hueRotate matrix.
fn hue_rotate_channels(r: f32, g: f32, b: f32, degrees: f32) -> (f32, f32, f32) {
    if degrees == 0.0 {
        return (r, g, b);
    }
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    (
        (LUM_R + cos * (1.0 - LUM_R) - sin * LUM_R) * r
            + (LUM_G - cos * LUM_G - sin * LUM_G) * g
            + (LUM_B - cos * LUM_B + sin * (1.0 - LUM_B)) * b,
        (LUM_R - cos * LUM_R + sin * 0.143) * r
            + (LUM_G + cos * (1.0 - LUM_G) + sin * 0.140) * g
            + (LUM_B - cos * LUM_B - sin * 0.283) * b,
        (LUM_R - cos * LUM_R - sin * (1.0 - LUM_R)) * r
            + (LUM_G - cos * LUM_G + sin * LUM_G) * g
            + (LUM_B + cos * (1.0 - LUM_B) + sin * LUM_B) * b,
    )
}

/// Style-preview chain used by the grade surface for lens thumbnails:
/// brightness, saturate, contrast, sepia, hue-rotate, then blur, in that
/// order. This is the secondary filter expression; the render pipeline
/// itself uses [`apply`].
pub fn grade_preview(src: &RgbaImage, s: &ProjectSettings) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let brightness = (s.brightness / 100.0).max(0.0);
    let saturation = (s.saturation / 100.0).max(0.0);
    let contrast = (s.contrast / 100.0).max(0.0);
    let sepia = (s.sepia / 100.0).clamp(0.0, 1.0);
    let hue = s.hue;

    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let mut r = row_in[pi] as f32 / 255.0 * brightness;
                let mut g = row_in[pi + 1] as f32 / 255.0 * brightness;
                let mut b = row_in[pi + 2] as f32 / 255.0 * brightness;
                (r, g, b) = saturate_channels(r, g, b, saturation);
                r = (r - 0.5) * contrast + 0.5;
                g = (g - 0.5) * contrast + 0.5;
                b = (b - 0.5) * contrast + 0.5;
                (r, g, b) = sepia_channels(r, g, b, sepia);
                (r, g, b) = hue_rotate_channels(r, g, b, hue);
                row_out[pi] = (r * 255.0).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = (g * 255.0).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = (b * 255.0).round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = row_in[pi + 3];
            }
        });

    let colored = RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("preview buffer matches image dimensions");

    let sigma = s.blur.clamp(0.0, 50.0);
    if sigma > 0.0 {
        effects::gaussian_blur(&colored, sigma)
    } else {
        colored
    }
}
