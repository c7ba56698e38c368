use image::imageops::FilterType;

use super::gradient::rasterize;
use super::spec::BackgroundSpec;
use crate::canvas::Canvas;
use crate::io::load_image;
use crate::placement::crop_center;
use crate::HeadshotResult;

/// Realize a background description as a `width`x`height` canvas.
///
/// Solid fills, gradients and image backgrounds are opaque RGB; `Transparent`
/// is an all-zero RGBA canvas. Image backgrounds are scaled and cropped to
/// fill the canvas from the center, dropping any alpha they carry.
pub fn materialize(spec: &BackgroundSpec, width: u32, height: u32) -> HeadshotResult<Canvas> {
    let canvas = match spec {
        BackgroundSpec::Solid { color } => Canvas::solid(width, height, *color),
        BackgroundSpec::Gradient { colors, direction } => {
            Canvas::Rgb(rasterize(width, height, colors, *direction))
        }
        BackgroundSpec::Image { path } => {
            let decoded = Canvas::Rgb(load_image(path)?.into_rgb8());
            crop_center(&decoded, width, height, FilterType::Lanczos3)
        }
        BackgroundSpec::Transparent => Canvas::transparent(width, height),
    };
    Ok(canvas)
}
