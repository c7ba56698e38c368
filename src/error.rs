use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with [`HeadshotError`].
pub type HeadshotResult<T> = std::result::Result<T, HeadshotError>;

/// Error types that can occur while resizing, cutting out, or compositing.
///
/// This enum covers configuration problems detected before a batch starts,
/// failures tied to a single image, and missing cutout capabilities.
#[derive(Debug, Error)]
pub enum HeadshotError {
    /// Image loading, decoding, or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Tensor shape mismatch or invalid dimensions.
    #[error("Invalid tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    /// The cutout model failed to load or run.
    #[error("Cutout inference failed: {0}")]
    Inference(String),
    /// Alpha matte dimensions do not match the source image.
    #[error("Alpha matte size {found:?} does not match source image size {expected:?}")]
    AlphaMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    /// Model file not found at the specified path.
    #[error("Model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },
    /// Background removal was requested but no cutout service is configured.
    #[error("Background removal requested but no cutout service is available")]
    CutoutUnavailable,
    /// Target canvas dimensions must both be positive.
    #[error("Invalid canvas size {width}x{height}; width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    /// A background string was rejected by the strict parser.
    #[error("Invalid background `{0}`")]
    InvalidBackground(String),
    /// Alpha refinement settings outside their valid range.
    #[error("Invalid refine settings: {0}")]
    InvalidRefine(String),
    /// No workflow is registered under the given key.
    #[error("Unknown workflow `{0}`")]
    UnknownWorkflow(String),
    /// The input folder holds no images with a supported extension.
    #[error("No supported images found in {}", dir.display())]
    NoImages { dir: PathBuf },
}

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad settings; fatal to the whole run and reported once.
    Configuration,
    /// Tied to one input; counted and skipped.
    PerImage,
    /// A required service cannot be provided; fatal before any image runs.
    MissingCapability,
}

impl HeadshotError {
    /// Classify the error for the batch driver.
    pub fn class(&self) -> ErrorClass {
        match self {
            HeadshotError::InvalidDimensions { .. }
            | HeadshotError::InvalidBackground(_)
            | HeadshotError::InvalidRefine(_)
            | HeadshotError::UnknownWorkflow(_)
            | HeadshotError::NoImages { .. } => ErrorClass::Configuration,
            HeadshotError::ModelNotFound { .. } | HeadshotError::CutoutUnavailable => {
                ErrorClass::MissingCapability
            }
            HeadshotError::Image(_)
            | HeadshotError::Io(_)
            | HeadshotError::Shape(_)
            | HeadshotError::Inference(_)
            | HeadshotError::AlphaMismatch { .. } => ErrorClass::PerImage,
        }
    }

    pub(crate) fn inference(err: impl std::fmt::Display) -> Self {
        HeadshotError::Inference(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod class {
        use super::*;

        #[test]
        fn configuration_errors() {
            let errs = [
                HeadshotError::InvalidDimensions {
                    width: 0,
                    height: 10,
                },
                HeadshotError::InvalidBackground("zzz".into()),
                HeadshotError::InvalidRefine("alpha boost 0.5 is below 1.0".into()),
                HeadshotError::UnknownWorkflow("nope".into()),
                HeadshotError::NoImages {
                    dir: PathBuf::from("in"),
                },
            ];
            for err in errs {
                assert_eq!(err.class(), ErrorClass::Configuration, "{err}");
            }
        }

        #[test]
        fn capability_errors() {
            let missing = HeadshotError::ModelNotFound {
                path: PathBuf::from("models/bria-rmbg.onnx"),
            };
            assert_eq!(missing.class(), ErrorClass::MissingCapability);
            assert_eq!(
                HeadshotError::CutoutUnavailable.class(),
                ErrorClass::MissingCapability
            );
        }

        #[test]
        fn io_is_per_image() {
            let err = HeadshotError::from(std::io::Error::other("boom"));
            assert_eq!(err.class(), ErrorClass::PerImage);
        }
    }
}
