use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// An owned pixel buffer, either opaque RGB or RGBA with per-pixel alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum Canvas {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Canvas {
    /// Opaque canvas filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        Canvas::Rgb(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    /// Four-channel canvas with every channel of every pixel set to zero.
    pub fn transparent(width: u32, height: u32) -> Self {
        Canvas::Rgba(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])))
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Canvas::Rgb(img) => img.dimensions(),
            Canvas::Rgba(img) => img.dimensions(),
        }
    }

    /// Whether the canvas carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Canvas::Rgba(_))
    }

    /// Promote to four channels; opaque pixels get alpha 255.
    pub fn into_rgba(self) -> RgbaImage {
        match self {
            Canvas::Rgb(img) => DynamicImage::ImageRgb8(img).to_rgba8(),
            Canvas::Rgba(img) => img,
        }
    }

    /// Drop the alpha channel without blending.
    pub fn into_rgb(self) -> RgbImage {
        match self {
            Canvas::Rgb(img) => img,
            Canvas::Rgba(img) => DynamicImage::ImageRgba8(img).to_rgb8(),
        }
    }

    /// Resize to exactly `width`x`height`, keeping the channel mode.
    pub fn resized(&self, width: u32, height: u32, filter: FilterType) -> Canvas {
        match self {
            Canvas::Rgb(img) => Canvas::Rgb(imageops::resize(img, width, height, filter)),
            Canvas::Rgba(img) => Canvas::Rgba(imageops::resize(img, width, height, filter)),
        }
    }

    /// Copy out the `width`x`height` region whose top-left corner is at `(x, y)`.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> Canvas {
        match self {
            Canvas::Rgb(img) => {
                Canvas::Rgb(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Canvas::Rgba(img) => {
                Canvas::Rgba(imageops::crop_imm(img, x, y, width, height).to_image())
            }
        }
    }

    /// Paste `top` with its top-left corner at `(x, y)`; offsets may be negative
    /// and anything outside the canvas is clipped.
    ///
    /// An RGBA `top` blends by its own alpha; an RGB `top` replaces what is below.
    pub fn paste(&mut self, top: &Canvas, x: i64, y: i64) {
        match (self, top) {
            (Canvas::Rgba(bottom), Canvas::Rgba(top)) => {
                for_overlap(bottom.dimensions(), top.dimensions(), x, y, |bx, by, tx, ty| {
                    let out = blend(*bottom.get_pixel(bx, by), *top.get_pixel(tx, ty));
                    bottom.put_pixel(bx, by, out);
                });
            }
            (Canvas::Rgba(bottom), Canvas::Rgb(top)) => {
                for_overlap(bottom.dimensions(), top.dimensions(), x, y, |bx, by, tx, ty| {
                    let [r, g, b] = top.get_pixel(tx, ty).0;
                    bottom.put_pixel(bx, by, Rgba([r, g, b, 255]));
                });
            }
            (Canvas::Rgb(bottom), Canvas::Rgb(top)) => imageops::replace(bottom, top, x, y),
            (Canvas::Rgb(bottom), Canvas::Rgba(top)) => {
                for_overlap(bottom.dimensions(), top.dimensions(), x, y, |bx, by, tx, ty| {
                    let fg = top.get_pixel(tx, ty);
                    let bg = bottom.get_pixel_mut(bx, by);
                    let weight = f32::from(fg[3]) / 255.0;
                    for c in 0..3 {
                        let blended =
                            f32::from(fg[c]) * weight + f32::from(bg[c]) * (1.0 - weight);
                        bg[c] = blended.round().clamp(0.0, 255.0) as u8;
                    }
                });
            }
        }
    }
}

impl From<DynamicImage> for Canvas {
    /// Images with an alpha channel become RGBA, everything else RGB.
    fn from(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            Canvas::Rgba(image.into_rgba8())
        } else {
            Canvas::Rgb(image.into_rgb8())
        }
    }
}

impl From<Canvas> for DynamicImage {
    fn from(canvas: Canvas) -> Self {
        match canvas {
            Canvas::Rgb(img) => DynamicImage::ImageRgb8(img),
            Canvas::Rgba(img) => DynamicImage::ImageRgba8(img),
        }
    }
}

impl From<RgbImage> for Canvas {
    fn from(image: RgbImage) -> Self {
        Canvas::Rgb(image)
    }
}

impl From<RgbaImage> for Canvas {
    fn from(image: RgbaImage) -> Self {
        Canvas::Rgba(image)
    }
}

/// Visit every pixel where `top`, placed at `(x, y)`, overlaps `bottom`.
/// The callback receives bottom coordinates followed by top coordinates.
fn for_overlap(
    bottom: (u32, u32),
    top: (u32, u32),
    x: i64,
    y: i64,
    mut visit: impl FnMut(u32, u32, u32, u32),
) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(top.0)).min(i64::from(bottom.0));
    let y1 = (y + i64::from(top.1)).min(i64::from(bottom.1));
    for by in y0..y1 {
        for bx in x0..x1 {
            visit(bx as u32, by as u32, (bx - x) as u32, (by - y) as u32);
        }
    }
}

/// Blend all four channels of `fg` onto `bg`, weighted by the foreground alpha.
///
/// Alpha is blended like a color, so a half-transparent pixel over an opaque
/// background stays partly transparent.
fn blend(bg: Rgba<u8>, fg: Rgba<u8>) -> Rgba<u8> {
    let weight = f32::from(fg[3]) / 255.0;
    let mut rgba = [0u8; 4];
    for (c, out) in rgba.iter_mut().enumerate() {
        let blended = f32::from(fg[c]) * weight + f32::from(bg[c]) * (1.0 - weight);
        *out = blended.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(rgba)
}
