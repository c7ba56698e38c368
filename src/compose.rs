use image::imageops::FilterType;

use crate::background::{BackgroundSpec, materialize};
use crate::canvas::Canvas;
use crate::placement::{PlacementMode, Scaling, centered_offset, scaled_dimensions};
use crate::{HeadshotError, HeadshotResult};

/// Composite a cut-out foreground onto a background of `width`x`height`.
///
/// The foreground is scaled to fit inside the canvas for [`PlacementMode::Fill`]
/// and to cover it otherwise, then centered horizontally. It sits at the top
/// edge for [`PlacementMode::Top`] and is centered vertically for the other
/// modes; overflow is clipped. The foreground alpha is the blend weight for all
/// four channels, alpha included. The result is always RGBA, fully transparent
/// wherever a transparent background is not covered by the subject.
#[tracing::instrument(skip_all, fields(width = width, height = height, mode = %mode))]
pub fn compose(
    foreground: &Canvas,
    background: &BackgroundSpec,
    width: u32,
    height: u32,
    mode: PlacementMode,
    filter: FilterType,
) -> HeadshotResult<Canvas> {
    if width == 0 || height == 0 {
        return Err(HeadshotError::InvalidDimensions { width, height });
    }
    let scaling = match mode {
        PlacementMode::Fill => Scaling::Contain,
        PlacementMode::Center | PlacementMode::Top => Scaling::Cover,
    };
    let (new_w, new_h) = scaled_dimensions(foreground.dimensions(), (width, height), scaling);
    let resized = Canvas::Rgba(foreground.resized(new_w, new_h, filter).into_rgba());

    let mut canvas = Canvas::Rgba(materialize(background, width, height)?.into_rgba());
    let x = centered_offset(width, new_w);
    let y = match mode {
        PlacementMode::Top => 0,
        PlacementMode::Center | PlacementMode::Fill => centered_offset(height, new_h),
    };
    tracing::debug!(new_w, new_h, x, y, "placing foreground");
    canvas.paste(&resized, x, y);
    Ok(canvas)
}
