use std::fmt;

use image::imageops::FilterType;

use crate::canvas::Canvas;

/// How a source is mapped onto the target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Scale to cover the canvas, crop the overflow evenly on both axes.
    Center,
    /// Scale to cover the canvas, keep the top rows and crop from the bottom.
    #[default]
    Top,
    /// Scale to fit inside the canvas and pad the remainder with background.
    Fill,
}

impl PlacementMode {
    pub fn name(self) -> &'static str {
        match self {
            PlacementMode::Center => "center",
            PlacementMode::Top => "top",
            PlacementMode::Fill => "fill",
        }
    }

    fn scaling(self) -> Scaling {
        match self {
            PlacementMode::Fill => Scaling::Contain,
            PlacementMode::Center | PlacementMode::Top => Scaling::Cover,
        }
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which ratio drives scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// `max` of the axis ratios; the result covers the target.
    Cover,
    /// `min` of the axis ratios; the result fits inside the target.
    Contain,
}

/// Slack added before flooring scaled sizes.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// Scaled size of a `src` image for a `target` canvas.
///
/// Each axis is `floor(src * ratio)`, never below one pixel. Products within
/// [`RATIO_TOLERANCE`] of an integer count as that integer, so the axis that
/// defines the ratio lands exactly on the target despite float error. With
/// [`Scaling::Cover`] the result is also never smaller than the target, so a
/// crop of exactly the target size always fits; with [`Scaling::Contain`] it
/// never exceeds the target.
pub fn scaled_dimensions(src: (u32, u32), target: (u32, u32), scaling: Scaling) -> (u32, u32) {
    let rx = f64::from(target.0) / f64::from(src.0.max(1));
    let ry = f64::from(target.1) / f64::from(src.1.max(1));
    let ratio = match scaling {
        Scaling::Cover => rx.max(ry),
        Scaling::Contain => rx.min(ry),
    };
    let axis = |src: u32, target: u32| -> u32 {
        let scaled = (f64::from(src) * ratio + RATIO_TOLERANCE)
            .floor()
            .min(f64::from(u32::MAX)) as u32;
        let scaled = match scaling {
            Scaling::Cover => scaled.max(target),
            Scaling::Contain => scaled.min(target),
        };
        scaled.max(1)
    };
    (axis(src.0, target.0), axis(src.1, target.1))
}

/// `floor((outer - inner) / 2)`; negative when `inner` overflows `outer`.
pub fn centered_offset(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)).div_euclid(2)
}

/// Scale to cover `width`x`height`, then crop the overflow evenly from both sides.
pub fn crop_center(source: &Canvas, width: u32, height: u32, filter: FilterType) -> Canvas {
    crop_to_fill(source, width, height, filter, true)
}

/// Scale to cover `width`x`height`, then crop keeping the top of the image.
///
/// Horizontal overflow is still split evenly; vertical overflow is removed from
/// the bottom so heads in portraits are not cut.
pub fn crop_top(source: &Canvas, width: u32, height: u32, filter: FilterType) -> Canvas {
    crop_to_fill(source, width, height, filter, false)
}

fn crop_to_fill(
    source: &Canvas,
    width: u32,
    height: u32,
    filter: FilterType,
    center_vertically: bool,
) -> Canvas {
    let (new_w, new_h) = scaled_dimensions(source.dimensions(), (width, height), Scaling::Cover);
    let resized = source.resized(new_w, new_h, filter);
    let left = (new_w - width) / 2;
    let top = if center_vertically {
        (new_h - height) / 2
    } else {
        0
    };
    resized.cropped(left, top, width, height)
}

/// Scale to fit inside `width`x`height` and center the result on a padded canvas.
///
/// The padding comes from `background` when given (it must already be
/// `width`x`height`), otherwise it is fully transparent. A source with alpha
/// is blended onto the padding by its own alpha.
pub fn fit_with_padding(
    source: &Canvas,
    width: u32,
    height: u32,
    background: Option<Canvas>,
    filter: FilterType,
) -> Canvas {
    let (new_w, new_h) =
        scaled_dimensions(source.dimensions(), (width, height), Scaling::Contain);
    let resized = source.resized(new_w, new_h, filter);
    let mut canvas = background.unwrap_or_else(|| Canvas::transparent(width, height));
    canvas.paste(
        &resized,
        centered_offset(width, new_w),
        centered_offset(height, new_h),
    );
    canvas
}

/// Place `source` on a `width`x`height` canvas using `mode`.
pub fn place(
    source: &Canvas,
    width: u32,
    height: u32,
    mode: PlacementMode,
    background: Option<Canvas>,
    filter: FilterType,
) -> Canvas {
    match mode.scaling() {
        Scaling::Contain => fit_with_padding(source, width, height, background, filter),
        Scaling::Cover if mode == PlacementMode::Center => {
            crop_center(source, width, height, filter)
        }
        Scaling::Cover => crop_top(source, width, height, filter),
    }
}
