//! Subject/background separation and the per-model session cache.

pub mod onnx;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;

use crate::canvas::Canvas;
use crate::refine::refine;
use crate::workflow::Workflow;
use crate::{HeadshotError, HeadshotResult};

pub use onnx::{OnnxCutout, OnnxCutoutFactory};

/// A loaded model that separates a subject from its background.
pub trait CutoutService: Send + Sync {
    /// Return an image of the same size whose alpha is the subject confidence.
    fn cut(&self, image: &RgbaImage) -> HeadshotResult<RgbaImage>;
}

/// Creates cutout services for model identifiers.
pub trait CutoutFactory: Send + Sync {
    fn create(&self, model: &str) -> HeadshotResult<Arc<dyn CutoutService>>;
}

/// Cutout services keyed by model identifier.
///
/// Each identifier is created at most once through the factory and kept for the
/// lifetime of the cache.
pub struct SessionCache {
    factory: Box<dyn CutoutFactory>,
    sessions: Mutex<HashMap<String, Arc<dyn CutoutService>>>,
}

impl SessionCache {
    pub fn new(factory: impl CutoutFactory + 'static) -> Self {
        Self::with_factory(Box::new(factory))
    }

    pub fn with_factory(factory: Box<dyn CutoutFactory>) -> Self {
        Self {
            factory,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the service for `model`, creating it on first use.
    ///
    /// The lock is held while the factory runs so concurrent callers never load
    /// the same model twice. A failed creation is not cached.
    pub fn get_or_init(&self, model: &str) -> HeadshotResult<Arc<dyn CutoutService>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(service) = sessions.get(model) {
            return Ok(Arc::clone(service));
        }
        tracing::info!(model, "loading cutout model");
        let service = self.factory.create(model)?;
        sessions.insert(model.to_string(), Arc::clone(&service));
        Ok(service)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(model)
    }

    /// Number of models loaded so far.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("loaded", &self.len())
            .finish_non_exhaustive()
    }
}

/// Cut the subject out of `image` with the workflow's model and refine the alpha.
///
/// The result is always RGBA and the same size as the input.
pub fn remove_background(
    image: Canvas,
    workflow: &Workflow,
    cache: &SessionCache,
) -> HeadshotResult<Canvas> {
    workflow.refine.validate()?;
    let service = cache.get_or_init(&workflow.model)?;
    let rgba = image.into_rgba();
    let cut = service.cut(&rgba)?;
    if cut.dimensions() != rgba.dimensions() {
        return Err(HeadshotError::AlphaMismatch {
            expected: rgba.dimensions(),
            found: cut.dimensions(),
        });
    }
    Ok(refine(Canvas::Rgba(cut), &workflow.refine))
}
