// ============================================================================
// OPTICAL EFFECTS — Gaussian blur and the vignette pass
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::blend;
use crate::settings::BlendMode;

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for i in 0..len {
        let x = i as f32 - radius as f32;
        let v = (-x * x / s2).exp();
        kernel[i] = v;
        sum += v;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur, row-parallel via rayon. Edge pixels clamp.
pub fn gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let src_raw = src.as_raw();

    let pixel_count = w * h * 4;
    let buf_in: Vec<f32> = src_raw.iter().map(|&b| b as f32).collect();

    // Horizontal pass
    let mut buf_h = vec![0.0f32; pixel_count];
    buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        let row_in_start = y * w * 4;
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize)
                    .max(0)
                    .min(w as isize - 1) as usize;
                let idx = row_in_start + sx * 4;
                for c in 0..4 {
                    acc[c] += buf_in[idx + c] * kv;
                }
            }
            let out_idx = x * 4;
            row_out[out_idx..out_idx + 4].copy_from_slice(&acc);
        }
    });

    // Vertical pass
    let mut buf_v = vec![0.0f32; pixel_count];
    buf_v.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize)
                    .max(0)
                    .min(h as isize - 1) as usize;
                let idx = sy * w * 4 + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            let out_idx = x * 4;
            row_out[out_idx..out_idx + 4].copy_from_slice(&acc);
        }
    });

    let dst_raw: Vec<u8> = buf_v
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("blur buffer matches image dimensions")
}

/// Radial vignette composited over the frame.
///
/// A gradient from fully transparent at the center to black at opacity
/// `amount/100` at radius `max(w, h) / 1.1`, applied source-over. `amount`
/// outside 0–100 saturates.
pub fn vignette_pass(src: &RgbaImage, amount: f32) -> RgbaImage {
    let strength = (amount / 100.0).clamp(0.0, 1.0);
    if strength <= 0.0 {
        return src.clone();
    }

    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let radius = (w.max(h) as f32) / 1.1;

    let mut out = src.clone();
    let stride = w as usize * 4;
    out.as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 + 0.5 - cy;
            for x in 0..w as usize {
                let dx = x as f32 + 0.5 - cx;
                let t = ((dx * dx + dy * dy).sqrt() / radius).min(1.0);
                let alpha = t * strength;
                if alpha <= 0.0 {
                    continue;
                }
                let pi = x * 4;
                let base = Rgba([row[pi], row[pi + 1], row[pi + 2], row[pi + 3]]);
                let shade = Rgba([0, 0, 0, (alpha * 255.0).round() as u8]);
                let blended = blend::blend_pixel(base, shade, BlendMode::Normal, 1.0);
                row[pi..pi + 4].copy_from_slice(&blended.0);
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn zero_sigma_blur_is_identity() {
        let img = flat(8, 8, [10, 20, 30, 255]);
        assert_eq!(gaussian_blur(&img, 0.0), img);
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let img = flat(16, 16, [90, 120, 200, 255]);
        let blurred = gaussian_blur(&img, 2.0);
        // A constant image is a fixed point of any normalized kernel.
        for p in blurred.pixels() {
            for c in 0..4 {
                assert!((p[c] as i32 - img.get_pixel(0, 0)[c] as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn blur_smears_an_impulse() {
        let mut img = flat(9, 9, [0, 0, 0, 255]);
        img.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let blurred = gaussian_blur(&img, 1.5);
        assert!(blurred.get_pixel(4, 4)[0] < 255);
        assert!(blurred.get_pixel(5, 4)[0] > 0);
    }

    #[test]
    fn vignette_zero_is_identity() {
        let img = flat(10, 10, [200, 180, 160, 255]);
        assert_eq!(vignette_pass(&img, 0.0), img);
    }

    #[test]
    fn vignette_darkens_corners_more_than_center() {
        let img = flat(100, 80, [200, 200, 200, 255]);
        let out = vignette_pass(&img, 60.0);
        let center = out.get_pixel(50, 40)[0];
        let corner = out.get_pixel(0, 0)[0];
        assert!(corner < center);
        // Near the exact center the gradient contributes almost nothing.
        assert!(center >= 198);
    }

    #[test]
    fn vignette_saturates_out_of_range_amount() {
        let img = flat(10, 10, [50, 50, 50, 255]);
        let a = vignette_pass(&img, 250.0);
        let b = vignette_pass(&img, 100.0);
        assert_eq!(a, b);
    }
}
