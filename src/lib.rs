pub mod background;
pub mod batch;
pub mod canvas;
pub mod compose;
pub mod config;
pub mod cutout;
pub mod error;
pub mod io;
pub mod placement;
pub mod presets;
pub mod refine;
pub mod workflow;

pub use background::{BackgroundSpec, GradientDirection};
pub use batch::{BatchEvent, BatchRequest, BatchSummary, run_batch, spawn_batch};
pub use canvas::Canvas;
pub use config::{CanvasSettings, CutoutSettings, ENV_MODEL_DIR, RefineOptions};
pub use cutout::{
    CutoutFactory, CutoutService, OnnxCutoutFactory, SessionCache, remove_background,
};
pub use error::{ErrorClass, HeadshotError, HeadshotResult};
pub use io::OutputFormat;
pub use placement::PlacementMode;
pub use workflow::{Workflow, WorkflowRegistry};

use std::path::Path;

use image::imageops::FilterType;

use crate::background::materialize;

/// Entry point for fitting images onto a fixed-size canvas.
#[derive(Debug, Clone)]
pub struct Resizer {
    canvas: CanvasSettings,
    /// Fill padding for plain resizes, and the backdrop for cut-out subjects.
    background: BackgroundSpec,
}

impl Resizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: CanvasSettings::new(width, height),
            background: BackgroundSpec::default(),
        }
    }

    /// Set how sources are mapped onto the canvas.
    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.canvas.placement = placement;
        self
    }

    /// Set the background painted behind subjects and into fill padding.
    pub fn with_background(mut self, background: BackgroundSpec) -> Self {
        self.background = background;
        self
    }

    /// Set the filter used whenever an image is resized.
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.canvas.resize_filter = filter;
        self
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn background(&self) -> &BackgroundSpec {
        &self.background
    }

    /// Resize `source` onto the canvas without removing its background.
    ///
    /// Only [`PlacementMode::Fill`] paints the background, into the padding.
    pub fn place(&self, source: &Canvas) -> HeadshotResult<Canvas> {
        self.canvas.validate()?;
        let CanvasSettings {
            width,
            height,
            placement,
            resize_filter,
        } = self.canvas;
        let padding = match placement {
            PlacementMode::Fill => Some(materialize(&self.background, width, height)?),
            PlacementMode::Center | PlacementMode::Top => None,
        };
        Ok(crate::placement::place(
            source,
            width,
            height,
            placement,
            padding,
            resize_filter,
        ))
    }

    /// Composite an already cut-out foreground onto the background.
    pub fn compose(&self, foreground: &Canvas) -> HeadshotResult<Canvas> {
        crate::compose::compose(
            foreground,
            &self.background,
            self.canvas.width,
            self.canvas.height,
            self.canvas.placement,
            self.canvas.resize_filter,
        )
    }

    /// Remove the background with `workflow`, then composite the subject.
    pub fn cut_and_compose(
        &self,
        image: Canvas,
        workflow: &Workflow,
        cache: &SessionCache,
    ) -> HeadshotResult<Canvas> {
        self.canvas.validate()?;
        let foreground = remove_background(image, workflow, cache)?;
        self.compose(&foreground)
    }

    /// Load an image from disk with its EXIF orientation applied, and resize it.
    pub fn place_file(&self, path: impl AsRef<Path>) -> HeadshotResult<Canvas> {
        let image = io::load_image(path.as_ref())?;
        self.place(&Canvas::Rgb(image.into_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::testing::CountingFactory;

    mod place {
        use super::*;

        #[test]
        fn fill_pads_with_background() {
            let resizer = Resizer::new(10, 10)
                .with_placement(PlacementMode::Fill)
                .with_background(BackgroundSpec::Solid { color: [0, 0, 255] })
                .with_resize_filter(FilterType::Nearest);
            let out = resizer.place(&Canvas::solid(10, 5, [255, 0, 0])).unwrap();
            let Canvas::Rgb(img) = out else {
                panic!("expected rgb")
            };
            assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
            assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0]);
            assert_eq!(img.get_pixel(9, 9).0, [0, 0, 255]);
        }

        #[test]
        fn crop_modes_ignore_background() {
            let resizer = Resizer::new(4, 4)
                .with_placement(PlacementMode::Center)
                .with_background(BackgroundSpec::Transparent);
            let out = resizer.place(&Canvas::solid(8, 4, [1, 2, 3])).unwrap();
            assert!(!out.has_alpha());
            assert_eq!(out.dimensions(), (4, 4));
        }

        #[test]
        fn zero_width_rejected() {
            let err = Resizer::new(0, 4)
                .place(&Canvas::solid(2, 2, [0, 0, 0]))
                .unwrap_err();
            assert_eq!(err.class(), ErrorClass::Configuration);
        }

        #[test]
        fn place_file_reads_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("in.png");
            io::save(
                Canvas::solid(30, 60, [5, 6, 7]),
                &path,
                OutputFormat::Png,
            )
            .unwrap();
            let out = Resizer::new(20, 20).place_file(&path).unwrap();
            assert_eq!(out.dimensions(), (20, 20));
        }
    }

    mod cut_and_compose {
        use super::*;

        #[test]
        fn transparent_background_keeps_cleared_half() {
            let cache = SessionCache::new(CountingFactory::default());
            let workflow = WorkflowRegistry::builtin().resolve("portrait").unwrap().clone();
            let resizer = Resizer::new(8, 8)
                .with_background(BackgroundSpec::Transparent)
                .with_resize_filter(FilterType::Nearest);

            let out = resizer
                .cut_and_compose(Canvas::solid(8, 8, [40, 50, 60]), &workflow, &cache)
                .unwrap();
            let Canvas::Rgba(img) = out else {
                panic!("expected rgba")
            };
            assert_eq!(img.get_pixel(0, 4)[3], 255);
            assert_eq!(img.get_pixel(7, 4)[3], 0);
            assert_eq!(cache.len(), 1);
        }
    }
}
