//! Folder-to-folder batch processing with progress events.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use image::imageops::FilterType;

use crate::background::BackgroundSpec;
use crate::canvas::Canvas;
use crate::config::CanvasSettings;
use crate::cutout::SessionCache;
use crate::io::{self, OutputFormat};
use crate::placement::PlacementMode;
use crate::workflow::{Workflow, WorkflowRegistry};
use crate::{HeadshotError, HeadshotResult, Resizer};

/// Label used for runs that only resize.
pub const RESIZE_ONLY_LABEL: &str = "Resize Only";

/// Everything needed to process one input folder.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub placement: PlacementMode,
    pub format: OutputFormat,
    /// Backdrop for cut-out subjects; plain resizes always pad with white.
    pub background: BackgroundSpec,
    /// Workflow keys to run, in order. Empty means resize only.
    pub workflows: Vec<String>,
    pub resize_filter: FilterType,
}

impl BatchRequest {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            width,
            height,
            placement: PlacementMode::default(),
            format: OutputFormat::default(),
            background: BackgroundSpec::default(),
            workflows: Vec::new(),
            resize_filter: FilterType::Lanczos3,
        }
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_background(mut self, background: BackgroundSpec) -> Self {
        self.background = background;
        self
    }

    pub fn with_workflows<I, S>(mut self, workflows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workflows = workflows.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    fn canvas(&self) -> CanvasSettings {
        CanvasSettings::new(self.width, self.height)
            .with_placement(self.placement)
            .with_resize_filter(self.resize_filter)
    }

    /// The format actually written: JPEG cannot keep a transparent background,
    /// so cut-out runs on one are written as PNG instead.
    pub fn effective_format(&self) -> OutputFormat {
        if !self.workflows.is_empty()
            && self.background.is_transparent()
            && !self.format.supports_alpha()
        {
            OutputFormat::Png
        } else {
            self.format
        }
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    WorkflowStarted {
        /// Zero-based position among the runs.
        run: usize,
        runs: usize,
        label: String,
        output_dir: PathBuf,
        images: usize,
    },
    ImageProcessed {
        /// One-based position within the run.
        index: usize,
        total: usize,
        name: String,
        original_size: (u32, u32),
        output: PathBuf,
    },
    ImageFailed {
        index: usize,
        total: usize,
        name: String,
        error: String,
    },
    /// Overall completion in `[0, 1]`.
    Progress(f64),
    WorkflowFinished(RunSummary),
    Finished(BatchSummary),
}

/// Outcome of a single run over the input folder.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// `None` for a resize-only run.
    pub workflow: Option<String>,
    pub label: String,
    pub output_dir: PathBuf,
    pub processed: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub format: OutputFormat,
    pub runs: Vec<RunSummary>,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.runs.iter().map(|run| run.processed).sum()
    }

    pub fn errors(&self) -> usize {
        self.runs.iter().map(|run| run.errors).sum()
    }

    pub fn output_dirs(&self) -> impl Iterator<Item = &Path> {
        self.runs.iter().map(|run| run.output_dir.as_path())
    }
}

/// Supported images directly inside `dir`, sorted by path.
pub fn collect_images(dir: &Path) -> HeadshotResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && io::is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// `fraction` of the whole batch done after `done` images of run `run`.
pub fn overall_progress(run: usize, done: usize, runs: usize, images: usize) -> f64 {
    let total = runs * images;
    if total == 0 {
        return 1.0;
    }
    (run * images + done) as f64 / total as f64
}

fn emit(events: &Sender<BatchEvent>, event: BatchEvent) {
    // a dropped receiver only means nobody is watching
    let _ = events.send(event);
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn output_path(dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}.{}", format.extension()))
}

struct Run<'a> {
    workflow: Option<&'a Workflow>,
    output_dir: PathBuf,
}

impl Run<'_> {
    fn label(&self) -> &str {
        self.workflow
            .map_or(RESIZE_ONLY_LABEL, |workflow| workflow.label.as_str())
    }
}

/// Check everything that can fail before the first image and plan the runs.
fn prepare<'a>(
    request: &BatchRequest,
    registry: &'a WorkflowRegistry,
    cache: Option<&SessionCache>,
) -> HeadshotResult<(Vec<Run<'a>>, Vec<PathBuf>)> {
    request.canvas().validate()?;

    let workflows = request
        .workflows
        .iter()
        .map(|key| registry.resolve(key))
        .collect::<HeadshotResult<Vec<_>>>()?;

    if !workflows.is_empty() {
        let cache = cache.ok_or(HeadshotError::CutoutUnavailable)?;
        for workflow in &workflows {
            cache.get_or_init(&workflow.model)?;
        }
    }

    let images = collect_images(&request.input_dir)?;
    if images.is_empty() {
        return Err(HeadshotError::NoImages {
            dir: request.input_dir.clone(),
        });
    }

    let runs = if workflows.is_empty() {
        vec![Run {
            workflow: None,
            output_dir: request.output_dir.clone(),
        }]
    } else {
        let nested = workflows.len() > 1;
        workflows
            .into_iter()
            .map(|workflow| Run {
                output_dir: if nested {
                    request.output_dir.join(&workflow.key)
                } else {
                    request.output_dir.clone()
                },
                workflow: Some(workflow),
            })
            .collect()
    };
    Ok((runs, images))
}

fn process_image(
    path: &Path,
    run: &Run<'_>,
    resizer: &Resizer,
    cache: Option<&SessionCache>,
    format: OutputFormat,
) -> HeadshotResult<((u32, u32), PathBuf)> {
    let image = io::load_image(path)?;
    let original_size = (image.width(), image.height());

    let canvas = match run.workflow {
        Some(workflow) => {
            let cache = cache.ok_or(HeadshotError::CutoutUnavailable)?;
            resizer.cut_and_compose(Canvas::Rgba(image.into_rgba8()), workflow, cache)?
        }
        None => resizer.place(&Canvas::Rgb(image.into_rgb8()))?,
    };

    let output = output_path(&run.output_dir, path, format);
    io::save(canvas, &output, format)?;
    Ok((original_size, output))
}

/// Process every supported image in `request.input_dir`.
///
/// Configuration problems and missing models fail the whole batch before any
/// image is touched. Failures on individual images are reported through
/// `events`, counted, and skipped.
pub fn run_batch(
    request: &BatchRequest,
    registry: &WorkflowRegistry,
    cache: Option<&SessionCache>,
    events: &Sender<BatchEvent>,
) -> HeadshotResult<BatchSummary> {
    let (runs, images) = prepare(request, registry, cache)?;

    let format = request.effective_format();
    if format != request.format {
        tracing::warn!(
            requested = request.format.extension(),
            using = format.extension(),
            "output format cannot keep transparency, switching"
        );
    }

    let canvas = request.canvas();
    let cutout_resizer = Resizer::new(canvas.width, canvas.height)
        .with_placement(canvas.placement)
        .with_resize_filter(canvas.resize_filter)
        .with_background(request.background.clone());
    let plain_resizer = cutout_resizer
        .clone()
        .with_background(BackgroundSpec::default());

    let total = images.len();
    let mut summary = BatchSummary {
        format,
        runs: Vec::with_capacity(runs.len()),
    };

    for (run_index, run) in runs.iter().enumerate() {
        fs::create_dir_all(&run.output_dir)?;
        let resizer = if run.workflow.is_some() {
            &cutout_resizer
        } else {
            &plain_resizer
        };

        tracing::info!(
            run = run_index + 1,
            runs = runs.len(),
            label = run.label(),
            images = total,
            width = canvas.width,
            height = canvas.height,
            mode = %canvas.placement,
            "starting run"
        );
        emit(
            events,
            BatchEvent::WorkflowStarted {
                run: run_index,
                runs: runs.len(),
                label: run.label().to_string(),
                output_dir: run.output_dir.clone(),
                images: total,
            },
        );

        let mut processed = 0;
        let mut errors = 0;
        for (i, path) in images.iter().enumerate() {
            let name = file_name(path);
            match process_image(path, run, resizer, cache, format) {
                Ok((original_size, output)) => {
                    processed += 1;
                    tracing::info!(
                        index = i + 1,
                        total,
                        name = %name,
                        width = original_size.0,
                        height = original_size.1,
                        "processed"
                    );
                    emit(
                        events,
                        BatchEvent::ImageProcessed {
                            index: i + 1,
                            total,
                            name,
                            original_size,
                            output,
                        },
                    );
                }
                Err(err) => {
                    errors += 1;
                    tracing::warn!(index = i + 1, total, name = %name, error = %err, "failed");
                    emit(
                        events,
                        BatchEvent::ImageFailed {
                            index: i + 1,
                            total,
                            name,
                            error: err.to_string(),
                        },
                    );
                }
            }
            emit(
                events,
                BatchEvent::Progress(overall_progress(run_index, i + 1, runs.len(), total)),
            );
        }

        let run_summary = RunSummary {
            workflow: run.workflow.map(|workflow| workflow.key.clone()),
            label: run.label().to_string(),
            output_dir: run.output_dir.clone(),
            processed,
            errors,
        };
        tracing::info!(label = run.label(), processed, errors, "run finished");
        emit(events, BatchEvent::WorkflowFinished(run_summary.clone()));
        summary.runs.push(run_summary);
    }

    tracing::info!(
        processed = summary.processed(),
        errors = summary.errors(),
        "batch complete"
    );
    emit(events, BatchEvent::Finished(summary.clone()));
    Ok(summary)
}

/// Run [`run_batch`] on a worker thread.
///
/// Events arrive on the returned receiver; the join handle yields the summary
/// or the error that stopped the batch.
pub fn spawn_batch(
    request: BatchRequest,
    registry: WorkflowRegistry,
    cache: Option<Arc<SessionCache>>,
) -> HeadshotResult<(Receiver<BatchEvent>, JoinHandle<HeadshotResult<BatchSummary>>)> {
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::Builder::new()
        .name("headshot-batch".to_string())
        .spawn(move || run_batch(&request, &registry, cache.as_deref(), &tx))?;
    Ok((rx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::testing::CountingFactory;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        io::save(Canvas::solid(w, h, [90, 120, 150]), &dir.join(name), OutputFormat::Png)
            .unwrap();
    }

    mod overall_progress {
        use super::*;

        #[test]
        fn spans_all_runs() {
            assert_eq!(overall_progress(0, 1, 2, 4), 1.0 / 8.0);
            assert_eq!(overall_progress(1, 4, 2, 4), 1.0);
            assert_eq!(overall_progress(0, 0, 0, 0), 1.0);
        }
    }

    mod collect_images {
        use super::*;

        #[test]
        fn sorted_and_filtered() {
            let dir = tempfile::tempdir().unwrap();
            write_png(dir.path(), "b.png", 2, 2);
            write_png(dir.path(), "a.PNG", 2, 2);
            fs::write(dir.path().join("notes.txt"), "hi").unwrap();
            fs::create_dir(dir.path().join("nested.png")).unwrap();

            let names: Vec<_> = collect_images(dir.path())
                .unwrap()
                .iter()
                .map(|p| file_name(p))
                .collect();
            assert_eq!(names, vec!["a.PNG", "b.png"]);
        }
    }

    mod effective_format {
        use super::*;

        #[test]
        fn transparent_cutout_switches_jpeg_to_png() {
            let request = BatchRequest::new("in", "out", 10, 10)
                .with_background(BackgroundSpec::Transparent)
                .with_workflows(["portrait"]);
            assert_eq!(request.effective_format(), OutputFormat::Png);
        }

        #[test]
        fn resize_only_keeps_jpeg() {
            let request =
                BatchRequest::new("in", "out", 10, 10).with_background(BackgroundSpec::Transparent);
            assert_eq!(request.effective_format(), OutputFormat::default());
        }

        #[test]
        fn webp_keeps_transparency() {
            let request = BatchRequest::new("in", "out", 10, 10)
                .with_format(OutputFormat::WebP)
                .with_background(BackgroundSpec::Transparent)
                .with_workflows(["portrait"]);
            assert_eq!(request.effective_format(), OutputFormat::WebP);
        }
    }

    mod prepare {
        use super::*;

        #[test]
        fn rejects_zero_width() {
            let dir = tempfile::tempdir().unwrap();
            let request = BatchRequest::new(dir.path(), dir.path(), 0, 10);
            let err = prepare(&request, &WorkflowRegistry::builtin(), None)
                .err()
                .unwrap();
            assert!(matches!(err, HeadshotError::InvalidDimensions { .. }));
        }

        #[test]
        fn rejects_unknown_workflow() {
            let dir = tempfile::tempdir().unwrap();
            let request = BatchRequest::new(dir.path(), dir.path(), 10, 10).with_workflows(["x"]);
            let err = prepare(&request, &WorkflowRegistry::builtin(), None)
                .err()
                .unwrap();
            assert!(matches!(err, HeadshotError::UnknownWorkflow(_)));
        }

        #[test]
        fn workflows_need_a_cache() {
            let dir = tempfile::tempdir().unwrap();
            write_png(dir.path(), "a.png", 2, 2);
            let request =
                BatchRequest::new(dir.path(), dir.path(), 10, 10).with_workflows(["portrait"]);
            let err = prepare(&request, &WorkflowRegistry::builtin(), None)
                .err()
                .unwrap();
            assert!(matches!(err, HeadshotError::CutoutUnavailable));
        }

        #[test]
        fn empty_folder_has_no_images() {
            let dir = tempfile::tempdir().unwrap();
            let request = BatchRequest::new(dir.path(), dir.path(), 10, 10);
            let err = prepare(&request, &WorkflowRegistry::builtin(), None)
                .err()
                .unwrap();
            assert!(matches!(err, HeadshotError::NoImages { .. }));
        }

        #[test]
        fn initializes_every_model_up_front() {
            let dir = tempfile::tempdir().unwrap();
            write_png(dir.path(), "a.png", 2, 2);
            let cache = SessionCache::new(CountingFactory::default());
            let request = BatchRequest::new(dir.path(), dir.path().join("out"), 10, 10)
                .with_workflows(["portrait", "bria"]);

            let registry = WorkflowRegistry::builtin();
            let (runs, images) = prepare(&request, &registry, Some(&cache))
                .ok()
                .unwrap();
            assert_eq!(cache.len(), 2);
            assert_eq!(images.len(), 1);
            assert_eq!(runs.len(), 2);
            assert_eq!(runs[0].output_dir, dir.path().join("out").join("portrait"));
            assert_eq!(runs[1].label(), "High Detail (BRIA RMBG)");
        }

        #[test]
        fn single_workflow_writes_to_output_root() {
            let dir = tempfile::tempdir().unwrap();
            write_png(dir.path(), "a.png", 2, 2);
            let cache = SessionCache::new(CountingFactory::default());
            let request = BatchRequest::new(dir.path(), dir.path().join("out"), 10, 10)
                .with_workflows(["general"]);

            let registry = WorkflowRegistry::builtin();
            let (runs, _) = prepare(&request, &registry, Some(&cache))
                .ok()
                .unwrap();
            assert_eq!(runs[0].output_dir, dir.path().join("out"));
        }
    }

    #[test]
    fn output_path_replaces_extension() {
        let out = output_path(Path::new("out"), Path::new("in/photo.jpeg"), OutputFormat::WebP);
        assert_eq!(out, PathBuf::from("out/photo.webp"));
    }
}
