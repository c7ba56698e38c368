use std::convert::TryFrom;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::open;
use ndarray::{Array2, Array4, ArrayViewD, Axis, Ix2};
use ort::session::Session;
use ort::value::Tensor;

use super::{CutoutFactory, CutoutService};
use crate::config::CutoutSettings;
use crate::refine::with_alpha;
use crate::{HeadshotError, HeadshotResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInputSpec {
    pub width: usize,
    pub height: usize,
    pub layout: ChannelLayout,
}

/// BiRefNet and RMBG both take 1024x1024 NCHW input.
pub const DEFAULT_MODEL_INPUT_SPEC: ModelInputSpec = ModelInputSpec {
    width: 1024,
    height: 1024,
    layout: ChannelLayout::Nchw,
};

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Tries to figure out the model input spec from the session and falls back to the default.
pub fn determine_model_input_spec(session: &Session) -> ModelInputSpec {
    let dims = session
        .inputs()
        .first()
        .and_then(|input| input.dtype().tensor_shape())
        .map(|shape| shape.to_vec());
    spec_or_default(dims.as_deref())
}

fn spec_or_default(dims: Option<&[i64]>) -> ModelInputSpec {
    dims.and_then(spec_from_dims)
        .unwrap_or(DEFAULT_MODEL_INPUT_SPEC)
}

/// Interpret an input tensor shape, preferring NCHW when both layouts fit.
fn spec_from_dims(dims: &[i64]) -> Option<ModelInputSpec> {
    if dims.len() < 4 {
        return None;
    }
    infer_nchw_spec(dims).or_else(|| infer_nhwc_spec(dims))
}

/// Checks for an NCHW layout and returns a matching spec when dimensions line up.
fn infer_nchw_spec(dims: &[i64]) -> Option<ModelInputSpec> {
    let channels = *dims.get(1)?;
    if channels != 3 && channels != -1 {
        return None;
    }
    Some(ModelInputSpec {
        height: positive_dim_to_usize(*dims.get(2)?)?,
        width: positive_dim_to_usize(*dims.get(3)?)?,
        layout: ChannelLayout::Nchw,
    })
}

/// Checks for an NHWC layout and returns a matching spec when dimensions line up.
fn infer_nhwc_spec(dims: &[i64]) -> Option<ModelInputSpec> {
    let channels = *dims.get(3)?;
    if channels != 3 && channels != -1 {
        return None;
    }
    Some(ModelInputSpec {
        height: positive_dim_to_usize(*dims.get(1)?)?,
        width: positive_dim_to_usize(*dims.get(2)?)?,
        layout: ChannelLayout::Nhwc,
    })
}

/// Converts a positive i64 dimension to usize, returning None for non-positive or overflow.
fn positive_dim_to_usize(dim: i64) -> Option<usize> {
    if dim > 0 {
        usize::try_from(dim).ok()
    } else {
        None
    }
}

fn dim_to_u32(dim: usize, what: &str) -> HeadshotResult<u32> {
    u32::try_from(dim).map_err(|_| {
        HeadshotError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("model {what} {dim} exceeds u32"),
        ))
    })
}

/// Resize `rgb` to the model input size and normalize it with ImageNet mean/std.
pub fn image_to_array(
    rgb: &RgbImage,
    filter: image::imageops::FilterType,
    spec: ModelInputSpec,
) -> HeadshotResult<Array4<f32>> {
    let target_w = dim_to_u32(spec.width, "width")?;
    let target_h = dim_to_u32(spec.height, "height")?;
    let resized = image::imageops::resize(rgb, target_w, target_h, filter);
    let (w, h) = (spec.width, spec.height);
    let inv255 = 1.0 / 255.0;

    let mut array = match spec.layout {
        ChannelLayout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
        ChannelLayout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
    };
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = (f32::from(pixel[c]) * inv255 - MEAN[c]) / STD[c];
            match spec.layout {
                ChannelLayout::Nchw => array[[0, c, y, x]] = value,
                ChannelLayout::Nhwc => array[[0, y, x, c]] = value,
            }
        }
    }
    Ok(array)
}

/// Remove singleton axes to get the raw H×W matte from the model output.
pub fn extract_matte_hw(matte: ArrayViewD<f32>) -> HeadshotResult<Array2<f32>> {
    let original_shape: Vec<usize> = matte.shape().to_vec();
    let mut view = matte;

    while view.ndim() > 2 {
        let axis = view
            .shape()
            .iter()
            .position(|&len| len == 1)
            .ok_or_else(|| {
                HeadshotError::inference(format!(
                    "cannot infer H×W from output shape {original_shape:?}"
                ))
            })?;
        view = view.index_axis_move(Axis(axis), 0);
    }
    Ok(view.into_dimensionality::<Ix2>()?.to_owned())
}

/// Stretch the prediction to span `[0, 1]`.
///
/// A flat prediction has no range to stretch and is only clamped.
pub fn normalize_matte(matte: &mut Array2<f32>) {
    let (min, max) = matte
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if range.is_finite() && range > f32::EPSILON {
        matte.mapv_inplace(|v| (v - min) / range);
    } else {
        matte.mapv_inplace(|v| v.clamp(0.0, 1.0));
    }
}

/// Scale a `[0, 1]` matte to 8-bit, truncating.
pub fn matte_to_gray(matte: &Array2<f32>) -> GrayImage {
    let (h, w) = matte.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = matte[[y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(v * 255.0) as u8])
    })
}

/// Turn a soft matte into a clean hard mask: remove specks with a 3x3
/// opening, smooth the edges, then binarize at the midpoint.
pub fn post_process_mask(mask: &GrayImage) -> GrayImage {
    let opened = open(mask, Norm::L1, 1);
    let smoothed = gaussian_blur_f32(&opened, 2.0);
    // values > 126 become 255
    threshold(&smoothed, 126, ThresholdType::Binary)
}

/// Attach `matte` as the alpha channel of `image`.
pub fn attach_matte(image: &RgbaImage, matte: &GrayImage) -> HeadshotResult<RgbaImage> {
    let expected = image.dimensions();
    let found = matte.dimensions();
    if expected != found {
        return Err(HeadshotError::AlphaMismatch { expected, found });
    }
    Ok(with_alpha(image, matte))
}

/// A cutout backed by an ONNX Runtime session.
pub struct OnnxCutout {
    session: Mutex<Session>,
    spec: ModelInputSpec,
    settings: CutoutSettings,
}

impl OnnxCutout {
    /// Load the model at `path`.
    pub fn load(path: &Path, settings: &CutoutSettings) -> HeadshotResult<Self> {
        if !path.is_file() {
            return Err(HeadshotError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }
        let mut builder = Session::builder().map_err(HeadshotError::inference)?;
        if let Some(threads) = settings.intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(HeadshotError::inference)?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(HeadshotError::inference)?;
        let spec = determine_model_input_spec(&session);
        tracing::debug!(path = %path.display(), ?spec, "cutout session ready");

        Ok(Self {
            session: Mutex::new(session),
            spec,
            settings: settings.clone(),
        })
    }

    pub fn input_spec(&self) -> ModelInputSpec {
        self.spec
    }

    /// Predict the subject matte at the size of `rgb`.
    pub fn predict_matte(&self, rgb: &RgbImage) -> HeadshotResult<GrayImage> {
        let array = image_to_array(rgb, self.settings.input_resize_filter, self.spec)?;
        let tensor = Tensor::from_array(array).map_err(HeadshotError::inference)?;

        let mut raw = {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(HeadshotError::inference)?;
            let view = outputs[0]
                .try_extract_array::<f32>()
                .map_err(HeadshotError::inference)?;
            extract_matte_hw(view)?
        };
        normalize_matte(&mut raw);

        let (w, h) = rgb.dimensions();
        let matte = image::imageops::resize(
            &matte_to_gray(&raw),
            w,
            h,
            self.settings.output_resize_filter,
        );
        if self.settings.post_process_mask {
            Ok(post_process_mask(&matte))
        } else {
            Ok(matte)
        }
    }
}

impl CutoutService for OnnxCutout {
    fn cut(&self, image: &RgbaImage) -> HeadshotResult<RgbaImage> {
        let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
        let matte = self.predict_matte(&rgb)?;
        attach_matte(image, &matte)
    }
}

/// Loads `<model_dir>/<model>.onnx` for each requested model.
#[derive(Debug, Clone)]
pub struct OnnxCutoutFactory {
    settings: CutoutSettings,
}

impl OnnxCutoutFactory {
    pub fn new(settings: CutoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CutoutSettings {
        &self.settings
    }
}

impl CutoutFactory for OnnxCutoutFactory {
    fn create(&self, model: &str) -> HeadshotResult<Arc<dyn CutoutService>> {
        let path = self.settings.model_path(model);
        Ok(Arc::new(OnnxCutout::load(&path, &self.settings)?))
    }
}
