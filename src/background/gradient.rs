use image::{Rgb as RgbPixel, RgbImage};

use super::spec::{GradientDirection, Rgb};

/// Linearly interpolate two colors, truncating each channel toward zero.
pub fn lerp_color(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let a = f64::from(from[c]);
        let b = f64::from(to[c]);
        *slot = (a + (b - a) * t).trunc().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Sample a piecewise-linear gradient over equal-length segments at `t` in `[0, 1]`.
///
/// A single color is returned as is; an empty slice yields black.
pub fn multi_stop_color(colors: &[Rgb], t: f64) -> Rgb {
    match colors {
        [] => [0, 0, 0],
        [only] => *only,
        _ => {
            let n = colors.len() - 1;
            let scaled = t * n as f64;
            let segment = (scaled.floor().max(0.0) as usize).min(n - 1);
            let local_t = scaled - segment as f64;
            lerp_color(colors[segment], colors[segment + 1], local_t)
        }
    }
}

/// Rasterize a multi-stop gradient onto a fresh RGB image.
///
/// Identical inputs always produce identical pixels.
pub fn rasterize(
    width: u32,
    height: u32,
    colors: &[Rgb],
    direction: GradientDirection,
) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    let (w, h) = (f64::from(width), f64::from(height));

    match direction {
        GradientDirection::Down => {
            let denom = f64::from(height.saturating_sub(1).max(1));
            for y in 0..height {
                let color = RgbPixel(multi_stop_color(colors, f64::from(y) / denom));
                for x in 0..width {
                    img.put_pixel(x, y, color);
                }
            }
        }
        GradientDirection::Right => {
            let denom = f64::from(width.saturating_sub(1).max(1));
            let row: Vec<RgbPixel<u8>> = (0..width)
                .map(|x| RgbPixel(multi_stop_color(colors, f64::from(x) / denom)))
                .collect();
            for (x, _, px) in img.enumerate_pixels_mut() {
                *px = row[x as usize];
            }
        }
        GradientDirection::Diagonal => {
            let max_dist = w.hypot(h);
            for (x, y, px) in img.enumerate_pixels_mut() {
                let t = f64::from(x).hypot(f64::from(y)) / max_dist;
                *px = RgbPixel(multi_stop_color(colors, t));
            }
        }
        GradientDirection::Radial => {
            let (cx, cy) = (w / 2.0, h / 2.0);
            let max_r = cx.hypot(cy);
            for (x, y, px) in img.enumerate_pixels_mut() {
                let r = (f64::from(x) - cx).hypot(f64::from(y) - cy);
                let t = (r / max_r).min(1.0);
                *px = RgbPixel(multi_stop_color(colors, t));
            }
        }
    }

    img
}
