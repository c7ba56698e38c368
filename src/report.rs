use headshot::{ErrorClass, HeadshotError, WorkflowRegistry};

pub fn report_error(err: &HeadshotError) {
    match err {
        HeadshotError::ModelNotFound { path } => {
            eprintln!("Model file not found: {}", path.display());
            eprintln!();
            eprintln!("Background removal needs the ONNX model for each selected workflow.");
            eprintln!("Put `<model>.onnx` files in one folder and point to it:");
            eprintln!("  - Use --model-dir <dir>");
            eprintln!(
                "  - Or set environment variable {} to that folder",
                headshot::ENV_MODEL_DIR
            );
        }
        HeadshotError::UnknownWorkflow(key) => {
            let known: Vec<_> = WorkflowRegistry::builtin().keys().map(String::from).collect();
            eprintln!("Unknown workflow `{key}`");
            eprintln!("Available workflows: {}", known.join(", "));
            eprintln!("Run `headshot workflows` for details.");
        }
        HeadshotError::NoImages { dir } => {
            eprintln!("No supported images found in {}", dir.display());
            eprintln!(
                "Supported extensions: {}",
                headshot::io::SUPPORTED_EXTENSIONS.join(", ")
            );
        }
        _ if err.class() == ErrorClass::Configuration => {
            eprintln!("Invalid settings: {err}");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
