use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::canvas::Canvas;
use crate::config::RefineOptions;

/// A single transformation step applied to an alpha channel.
#[derive(Debug, Clone, PartialEq)]
pub enum AlphaOperation {
    Blur { sigma: f32 },
    /// Zero every value strictly below `threshold`.
    CutBelow { threshold: u8 },
    /// Multiply every non-zero value by `factor`, clamping at 255.
    Boost { factor: f64 },
}

impl AlphaOperation {
    pub fn apply(&self, input: &GrayImage) -> GrayImage {
        match self {
            AlphaOperation::Blur { sigma } => blur_alpha(input, *sigma),
            AlphaOperation::CutBelow { threshold } => cut_below(input, *threshold),
            AlphaOperation::Boost { factor } => boost_alpha(input, *factor),
        }
    }
}

/// Run a list of operations against the provided alpha channel.
pub fn apply_operations(source: &GrayImage, operations: &[AlphaOperation]) -> GrayImage {
    let mut current = source.clone();
    for op in operations {
        current = op.apply(&current);
    }
    current
}

/// The blur, cut, boost sequence described by `options`.
pub fn operations_from_options(options: &RefineOptions) -> Vec<AlphaOperation> {
    vec![
        AlphaOperation::Blur {
            sigma: options.blur_radius,
        },
        AlphaOperation::CutBelow {
            threshold: options.low_threshold,
        },
        AlphaOperation::Boost {
            factor: options.alpha_boost,
        },
    ]
}

/// Gaussian blur; a non-positive sigma leaves the channel as is.
pub fn blur_alpha(alpha: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 && sigma.is_finite() {
        gaussian_blur_f32(alpha, sigma)
    } else {
        alpha.clone()
    }
}

pub fn cut_below(alpha: &GrayImage, threshold: u8) -> GrayImage {
    map_alpha(alpha, |a| if a < threshold { 0 } else { a })
}

/// Scale by `factor`, truncating and clamping to 255.
pub fn boost_alpha(alpha: &GrayImage, factor: f64) -> GrayImage {
    let factor = factor.max(0.0);
    map_alpha(alpha, |a| (f64::from(a) * factor).trunc().min(255.0) as u8)
}

fn map_alpha(alpha: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let (w, h) = alpha.dimensions();
    let mut out = GrayImage::new(w, h);
    for (src, dst) in alpha.pixels().zip(out.pixels_mut()) {
        *dst = Luma([f(src[0])]);
    }
    out
}

/// Split the alpha channel out of an RGBA image.
pub fn extract_alpha(image: &RgbaImage) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut alpha = GrayImage::new(w, h);
    for (px, out) in image.pixels().zip(alpha.pixels_mut()) {
        *out = Luma([px[3]]);
    }
    alpha
}

/// Replace the alpha channel of `image`, keeping its color channels.
pub fn with_alpha(image: &RgbaImage, alpha: &GrayImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut out = RgbaImage::new(w, h);
    for ((px, a), dst) in image.pixels().zip(alpha.pixels()).zip(out.pixels_mut()) {
        *dst = Rgba([px[0], px[1], px[2], a[0]]);
    }
    out
}

/// Clean up a cutout's alpha: blur away jagged edges, drop faint noise below
/// the threshold, and boost what remains to recover thin partially
/// transparent detail such as hair.
///
/// Color channels are never touched, and an RGB canvas is returned unchanged.
pub fn refine(image: Canvas, options: &RefineOptions) -> Canvas {
    match image {
        Canvas::Rgb(_) => image,
        Canvas::Rgba(rgba) => {
            let operations = operations_from_options(options);
            let alpha = apply_operations(&extract_alpha(&rgba), &operations);
            Canvas::Rgba(with_alpha(&rgba, &alpha))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_image(w: u32, h: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([value]))
    }

    fn rgba_with_alpha(w: u32, h: u32, alpha: u8) -> Canvas {
        Canvas::Rgba(RgbaImage::from_pixel(w, h, Rgba([30, 60, 90, alpha])))
    }

    fn alphas(canvas: &Canvas) -> Vec<u8> {
        match canvas {
            Canvas::Rgba(img) => img.pixels().map(|p| p[3]).collect(),
            Canvas::Rgb(_) => panic!("expected rgba"),
        }
    }

    mod cut_below {
        use super::*;

        #[test]
        fn strictly_below_becomes_zero() {
            let mut input = GrayImage::new(3, 1);
            input.put_pixel(0, 0, Luma([19]));
            input.put_pixel(1, 0, Luma([20]));
            input.put_pixel(2, 0, Luma([200]));

            let out = cut_below(&input, 20);
            assert_eq!(out.as_raw(), &vec![0, 20, 200]);
        }

        #[test]
        fn threshold_zero_keeps_everything() {
            let input = gray_image(2, 2, 0);
            assert_eq!(cut_below(&input, 0), input);
        }
    }

    mod boost_alpha {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn truncates() {
                // 100 * 1.05 = 105.0, 101 * 1.05 = 106.05
                let mut input = GrayImage::new(2, 1);
                input.put_pixel(0, 0, Luma([100]));
                input.put_pixel(1, 0, Luma([101]));
                assert_eq!(boost_alpha(&input, 1.05).as_raw(), &vec![105, 106]);
            }

            #[test]
            fn clamps_at_255() {
                let out = boost_alpha(&gray_image(2, 2, 250), 1.1);
                assert!(out.pixels().all(|p| p[0] == 255));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// boost_alpha: factors >= 1 never lower a value
                #[test]
                fn never_decreases(value in any::<u8>(), factor in 1.0f64..3.0) {
                    let out = boost_alpha(&gray_image(1, 1, value), factor);
                    prop_assert!(out.get_pixel(0, 0)[0] >= value);
                }
            }
        }
    }

    mod blur_alpha {
        use super::*;

        #[test]
        fn zero_sigma_is_identity() {
            let mut input = gray_image(3, 3, 0);
            input.put_pixel(1, 1, Luma([255]));
            assert_eq!(blur_alpha(&input, 0.0), input);
        }

        #[test]
        fn softens_a_hard_edge() {
            let mut input = gray_image(9, 1, 0);
            for x in 5..9 {
                input.put_pixel(x, 0, Luma([255]));
            }
            let out = blur_alpha(&input, 1.0);
            let edge = out.get_pixel(5, 0)[0];
            assert!(edge > 0 && edge < 255);
        }
    }

    mod operations_from_options {
        use super::*;

        #[test]
        fn blur_cut_boost_order() {
            let opts = RefineOptions {
                blur_radius: 0.8,
                low_threshold: 15,
                alpha_boost: 1.08,
            };
            assert_eq!(
                operations_from_options(&opts),
                vec![
                    AlphaOperation::Blur { sigma: 0.8 },
                    AlphaOperation::CutBelow { threshold: 15 },
                    AlphaOperation::Boost { factor: 1.08 },
                ]
            );
        }
    }

    mod refine {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn rgb_is_unchanged() {
                let canvas = Canvas::solid(3, 3, [1, 2, 3]);
                assert_eq!(refine(canvas.clone(), &RefineOptions::default()), canvas);
            }

            #[test]
            fn opaque_alpha_stays_opaque() {
                let out = refine(rgba_with_alpha(6, 6, 255), &RefineOptions::default());
                assert!(alphas(&out).iter().all(|&a| a == 255));
            }

            #[test]
            fn zero_alpha_stays_zero() {
                let opts = RefineOptions {
                    blur_radius: 2.0,
                    low_threshold: 0,
                    alpha_boost: 3.0,
                };
                let out = refine(rgba_with_alpha(6, 6, 0), &opts);
                assert!(alphas(&out).iter().all(|&a| a == 0));
            }

            #[test]
            fn faint_noise_removed_and_partial_alpha_boosted() {
                let opts = RefineOptions {
                    blur_radius: 0.0,
                    low_threshold: 20,
                    alpha_boost: 1.5,
                };
                let mut img = RgbaImage::from_pixel(2, 1, Rgba([5, 5, 5, 10]));
                img.put_pixel(1, 0, Rgba([5, 5, 5, 100]));
                let out = refine(Canvas::Rgba(img), &opts);
                assert_eq!(alphas(&out), vec![0, 150]);
            }

            #[test]
            fn color_channels_untouched() {
                let mut img = RgbaImage::from_pixel(5, 5, Rgba([11, 22, 33, 0]));
                img.put_pixel(2, 2, Rgba([44, 55, 66, 255]));
                let refined = refine(Canvas::Rgba(img.clone()), &RefineOptions::default());
                let Canvas::Rgba(out) = refined else {
                    panic!("expected rgba")
                };
                for (a, b) in img.pixels().zip(out.pixels()) {
                    assert_eq!(a.0[..3], b.0[..3]);
                }
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// refine: fully transparent input stays transparent for any parameters
                #[test]
                fn transparent_stays_transparent(
                    threshold in any::<u8>(),
                    boost in 1.0f64..4.0,
                    radius in 0.0f32..3.0
                ) {
                    let opts = RefineOptions {
                        blur_radius: radius,
                        low_threshold: threshold,
                        alpha_boost: boost,
                    };
                    let out = refine(rgba_with_alpha(5, 4, 0), &opts);
                    prop_assert!(alphas(&out).iter().all(|&a| a == 0));
                }

                /// refine: fully opaque input stays opaque when the boost has headroom
                #[test]
                fn opaque_stays_opaque(
                    threshold in 0u8..=200,
                    boost in 1.01f64..4.0,
                    radius in 0.0f32..3.0
                ) {
                    let opts = RefineOptions {
                        blur_radius: radius,
                        low_threshold: threshold,
                        alpha_boost: boost,
                    };
                    let out = refine(rgba_with_alpha(5, 4, 255), &opts);
                    prop_assert!(alphas(&out).iter().all(|&a| a == 255));
                }
            }
        }
    }
}
