use std::path::PathBuf;

use image::imageops::FilterType;

use crate::placement::PlacementMode;
use crate::{HeadshotError, HeadshotResult};

/// Environment variable consulted by the CLI for the cutout model directory.
pub const ENV_MODEL_DIR: &str = "HEADSHOT_MODEL_DIR";

/// Target canvas and how sources are mapped onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub placement: PlacementMode,
    /// Filter used whenever a source or foreground is resized.
    pub resize_filter: FilterType,
}

impl CanvasSettings {
    /// Create new canvas settings with default placement and filter.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            placement: PlacementMode::default(),
            resize_filter: FilterType::Lanczos3,
        }
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Reject zero-sized canvases.
    pub fn validate(&self) -> HeadshotResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HeadshotError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Options describing how a cutout's alpha channel is cleaned up.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineOptions {
    /// Gaussian sigma applied to the alpha channel; zero disables the blur.
    pub blur_radius: f32,
    /// Alpha values strictly below this become fully transparent.
    pub low_threshold: u8,
    /// Multiplier for the remaining alpha values; at least 1.0, see [`validate`](Self::validate).
    pub alpha_boost: f64,
}

impl RefineOptions {
    /// Reject a boost below 1.0 and a negative or non-finite blur.
    pub fn validate(&self) -> HeadshotResult<()> {
        if !self.alpha_boost.is_finite() || self.alpha_boost < 1.0 {
            return Err(HeadshotError::InvalidRefine(format!(
                "alpha boost {} must be at least 1.0",
                self.alpha_boost
            )));
        }
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(HeadshotError::InvalidRefine(format!(
                "blur radius {} must be zero or positive",
                self.blur_radius
            )));
        }
        Ok(())
    }
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            blur_radius: 1.0,
            low_threshold: 20,
            alpha_boost: 1.05,
        }
    }
}

/// Options for loading ONNX cutout models.
#[derive(Debug, Clone)]
pub struct CutoutSettings {
    /// Directory holding `<model>.onnx` files.
    pub model_dir: PathBuf,
    /// Filter to use when resizing the input image for the model.
    pub input_resize_filter: FilterType,
    /// Filter to use when resizing the output matte to the original image size.
    pub output_resize_filter: FilterType,
    /// Number of intra-op threads for the inference.
    pub intra_threads: Option<usize>,
    /// Clean the predicted matte into a hard mask (open, blur, binarize) before
    /// it becomes the alpha channel.
    pub post_process_mask: bool,
}

impl CutoutSettings {
    /// Create new cutout settings with default values.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            input_resize_filter: FilterType::Triangle,
            output_resize_filter: FilterType::Lanczos3,
            intra_threads: None,
            post_process_mask: true,
        }
    }

    /// Set the filter used to resize the input image for the model.
    pub fn with_input_filter(mut self, filter: FilterType) -> Self {
        self.input_resize_filter = filter;
        self
    }

    /// Set the filter used to resize the matte back to the source size.
    pub fn with_output_filter(mut self, filter: FilterType) -> Self {
        self.output_resize_filter = filter;
        self
    }

    /// Set the number of intra-op threads for the inference.
    pub fn with_intra_threads(mut self, intra_threads: Option<usize>) -> Self {
        self.intra_threads = intra_threads;
        self
    }

    pub fn with_post_process_mask(mut self, enabled: bool) -> Self {
        self.post_process_mask = enabled;
        self
    }

    /// Path of the model file for a model identifier.
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.model_dir.join(format!("{model}.onnx"))
    }
}
