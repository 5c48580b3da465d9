// ============================================================================
// GEOMETRIC TRANSFORM — fit scaling, flips and rotation
// ============================================================================
//
// The pipeline draws the source once through the combined transform:
// translate to center, flip (axis scaling), rotate, translate back — flips
// before rotation. Implemented as an inverse mapping with bilinear sampling
// straight from the source, so the destination scale and the transform
// resolve in a single resampling step. Pixels that map outside the source
// are transparent, which matches drawing a rotated image into a canvas of
// the unrotated size.

use image::{imageops, Rgba, RgbaImage};
use rayon::prelude::*;

/// Normalize a rotation in degrees to `0..360`.
pub fn normalize_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Bilinear sample with pixel centers at (+0.5, +0.5). Out-of-bounds
/// coordinates return transparent.
pub fn bilinear_sample(src: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let w = src.width();
    let h = src.height();
    if x < 0.0 || y < 0.0 || x >= w as f32 || y >= h as f32 {
        return Rgba([0, 0, 0, 0]);
    }

    let gx = x - 0.5;
    let gy = y - 0.5;
    let x0 = gx.floor();
    let y0 = gy.floor();
    let fx = gx - x0;
    let fy = gy - y0;

    let clamp_x = |v: f32| (v.max(0.0) as u32).min(w - 1);
    let clamp_y = |v: f32| (v.max(0.0) as u32).min(h - 1);
    let (x0i, x1i) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (y0i, y1i) = (clamp_y(y0), clamp_y(y0 + 1.0));

    let p00 = src.get_pixel(x0i, y0i);
    let p10 = src.get_pixel(x1i, y0i);
    let p01 = src.get_pixel(x0i, y1i);
    let p11 = src.get_pixel(x1i, y1i);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Resample `src` into a `dest_w` x `dest_h` frame through the flip/rotate
/// transform. The identity transform takes an exact resize/clone fast path.
pub fn geometric_pass(
    src: &RgbaImage,
    dest_w: u32,
    dest_h: u32,
    flip_h: bool,
    flip_v: bool,
    rotation_deg: i32,
) -> RgbaImage {
    let dest_w = dest_w.max(1);
    let dest_h = dest_h.max(1);
    let rotation = normalize_rotation(rotation_deg);

    if rotation == 0 && !flip_h && !flip_v {
        if src.width() == dest_w && src.height() == dest_h {
            return src.clone();
        }
        return imageops::resize(src, dest_w, dest_h, imageops::FilterType::Triangle);
    }

    let theta = (rotation as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = dest_w as f32 / 2.0;
    let cy = dest_h as f32 / 2.0;
    let sx = src.width() as f32 / dest_w as f32;
    let sy = src.height() as f32 / dest_h as f32;
    let fx = if flip_h { -1.0 } else { 1.0 };
    let fy = if flip_v { -1.0 } else { 1.0 };

    let mut out = RgbaImage::new(dest_w, dest_h);
    let stride = dest_w as usize * 4;
    out.as_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 + 0.5 - cy;
            for x in 0..dest_w as usize {
                let dx = x as f32 + 0.5 - cx;
                // Invert the forward chain (flip then rotate): un-flip the
                // destination offset, then rotate it backwards.
                let ux = dx * fx;
                let uy = dy * fy;
                let qx = cx + ux * cos + uy * sin;
                let qy = cy - ux * sin + uy * cos;
                let px = bilinear_sample(src, qx * sx, qy * sy);
                let pi = x * 4;
                row[pi..pi + 4].copy_from_slice(&px.0);
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> RgbaImage {
        // A B
        // C D
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // A
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255])); // B
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255])); // C
        img.put_pixel(1, 1, Rgba([255, 255, 0, 255])); // D
        img
    }

    #[test]
    fn identity_transform_is_a_clone() {
        let img = quad();
        assert_eq!(geometric_pass(&img, 2, 2, false, false, 0), img);
    }

    #[test]
    fn rotation_normalizes_mod_360() {
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);

        let img = quad();
        assert_eq!(
            geometric_pass(&img, 2, 2, false, false, 720),
            geometric_pass(&img, 2, 2, false, false, 0)
        );
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let img = quad();
        let out = geometric_pass(&img, 2, 2, true, false, 0);
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(1, 0));
        assert_eq!(out.get_pixel(1, 0), img.get_pixel(0, 0));
        assert_eq!(out.get_pixel(0, 1), img.get_pixel(1, 1));
    }

    #[test]
    fn vertical_flip_mirrors_rows() {
        let img = quad();
        let out = geometric_pass(&img, 2, 2, false, true, 0);
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 1));
        assert_eq!(out.get_pixel(0, 1), img.get_pixel(0, 0));
    }

    #[test]
    fn quarter_turn_rotates_clockwise() {
        let img = quad();
        let out = geometric_pass(&img, 2, 2, false, false, 90);
        // C A
        // D B
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 1));
        assert_eq!(out.get_pixel(1, 0), img.get_pixel(0, 0));
        assert_eq!(out.get_pixel(0, 1), img.get_pixel(1, 1));
        assert_eq!(out.get_pixel(1, 1), img.get_pixel(1, 0));
    }

    #[test]
    fn four_quarter_turns_return_to_identity() {
        let img = quad();
        let mut rotation = 0;
        for _ in 0..4 {
            rotation = normalize_rotation(rotation + 90);
        }
        assert_eq!(rotation, 0);
        assert_eq!(geometric_pass(&img, 2, 2, false, false, rotation), img);
    }

    #[test]
    fn off_axis_rotation_leaves_corners_transparent() {
        let img = RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]));
        let out = geometric_pass(&img, 20, 10, false, false, 45);
        // The top-right of a wide frame maps outside the source once rotated.
        assert_eq!(out.get_pixel(19, 0)[3], 0);
        assert_eq!(out.get_pixel(10, 5)[3], 255);
    }

    #[test]
    fn resize_only_path_scales_the_source() {
        let img = RgbaImage::from_pixel(8, 4, Rgba([9, 9, 9, 255]));
        let out = geometric_pass(&img, 4, 2, false, false, 0);
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(0, 0).0, [9, 9, 9, 255]);
    }
}
