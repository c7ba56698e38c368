use std::io;
use std::sync::Arc;

use headshot::{
    BackgroundSpec, BatchEvent, BatchRequest, CutoutSettings, HeadshotError, HeadshotResult,
    OnnxCutoutFactory, SessionCache, WorkflowRegistry, spawn_batch,
};

use crate::cli::ResizeCommand;

/// The main function to run the resize command.
pub fn run(cmd: ResizeCommand) -> HeadshotResult<()> {
    let (width, height) = cmd.dimensions();
    let request = BatchRequest::new(&cmd.input, &cmd.output, width, height)
        .with_placement(cmd.mode.into())
        .with_format(cmd.output_format())
        .with_background(cmd.background.clone())
        .with_workflows(cmd.workflows.iter().cloned())
        .with_resize_filter(cmd.resample_filter.into());

    if request.workflows.is_empty() && request.background != BackgroundSpec::default() {
        tracing::warn!("--background only applies with --workflow; fill padding stays white");
    }
    let format = request.effective_format();
    if format != request.format {
        println!("JPEG does not support transparency. Switched to PNG.");
    }

    let cache = (!request.workflows.is_empty()).then(|| {
        let settings =
            CutoutSettings::new(&cmd.model_dir).with_intra_threads(cmd.intra_threads);
        Arc::new(SessionCache::new(OnnxCutoutFactory::new(settings)))
    });

    if cache.is_some() {
        println!("Loading AI models...");
    }
    let (events, handle) = spawn_batch(request, WorkflowRegistry::builtin(), cache)?;
    for event in events {
        print_event(&event, width, height, format.extension());
    }
    handle
        .join()
        .map_err(|_| HeadshotError::Io(io::Error::other("batch worker panicked")))??;
    Ok(())
}

fn print_event(event: &BatchEvent, width: u32, height: u32, extension: &str) {
    match event {
        BatchEvent::WorkflowStarted {
            run,
            runs,
            label,
            output_dir,
            images,
        } => {
            if *runs > 1 {
                println!();
                println!("Workflow {}/{runs}: {label}", run + 1);
            }
            println!(
                "Processing {images} images -> {width}x{height} ({extension}) into {}",
                output_dir.display()
            );
            println!();
        }
        BatchEvent::ImageProcessed {
            index,
            total,
            name,
            original_size,
            ..
        } => {
            let (w, h) = original_size;
            println!("  OK [{index}/{total}] {name} ({w}x{h})");
        }
        BatchEvent::ImageFailed {
            index,
            total,
            name,
            error,
        } => {
            println!("  FAIL [{index}/{total}] {name}: {error}");
        }
        BatchEvent::Progress(_) => {}
        BatchEvent::WorkflowFinished(run) => {
            println!();
            println!("  {}: {} processed, {} errors", run.label, run.processed, run.errors);
        }
        BatchEvent::Finished(summary) => {
            if summary.runs.len() > 1 {
                let folders: Vec<_> = summary
                    .output_dirs()
                    .map(|dir| dir.display().to_string())
                    .collect();
                println!();
                println!(
                    "All workflows complete: {} total processed, {} total errors",
                    summary.processed(),
                    summary.errors()
                );
                println!("Output folders: {}", folders.join(", "));
            }
            println!("Complete -- {} images processed", summary.processed());
        }
    }
}
