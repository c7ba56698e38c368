use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::canvas::Canvas;
use crate::HeadshotResult;

/// Extensions (lowercase) accepted as batch inputs.
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "webp", "tiff", "tif", "bmp", "gif"];

/// Whether the path has one of the [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Decode an image and rotate/flip it to match its EXIF orientation.
///
/// Orientation metadata that cannot be read is ignored.
pub fn load_image(path: &Path) -> HeadshotResult<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Lowest and highest quality accepted for lossy output.
pub const QUALITY_RANGE: (u8, u8) = (50, 100);

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossy; quality is clamped to [`QUALITY_RANGE`].
    Jpeg { quality: u8 },
    Png,
    /// Written lossless by the `image` crate encoder.
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 95 }
    }
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg { .. })
    }

    /// Drop the alpha channel when the format cannot store it.
    pub fn finalize(self, canvas: Canvas) -> Canvas {
        if self.supports_alpha() {
            canvas
        } else {
            Canvas::Rgb(canvas.into_rgb())
        }
    }
}

/// Encode a canvas into memory.
pub fn encode(canvas: Canvas, format: OutputFormat) -> HeadshotResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    write_encoded(canvas, format, &mut buffer)?;
    Ok(buffer.into_inner())
}

/// Encode a canvas and write it to `path`.
pub fn save(canvas: Canvas, path: &Path, format: OutputFormat) -> HeadshotResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_encoded(canvas, format, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_encoded<W: Write>(
    canvas: Canvas,
    format: OutputFormat,
    writer: &mut W,
) -> HeadshotResult<()> {
    let image = DynamicImage::from(format.finalize(canvas));
    match format {
        OutputFormat::Jpeg { quality } => {
            let quality = quality.clamp(QUALITY_RANGE.0, QUALITY_RANGE.1);
            image.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))?
        }
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(writer))?,
        OutputFormat::WebP => image.write_with_encoder(WebPEncoder::new_lossless(writer))?,
    }
    Ok(())
}
