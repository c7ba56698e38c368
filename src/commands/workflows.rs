use headshot::{HeadshotResult, WorkflowRegistry};

/// Print every registered workflow with its model and refinement settings.
pub fn run() -> HeadshotResult<()> {
    for workflow in WorkflowRegistry::builtin().iter() {
        println!("{:<10} {}", workflow.key, workflow.label);
        println!("{:<10} {}", "", workflow.description);
        println!(
            "{:<10} model {}, blur {}, cut below {}, boost {}",
            "",
            workflow.model,
            workflow.refine.blur_radius,
            workflow.refine.low_threshold,
            workflow.refine.alpha_boost
        );
        println!();
    }
    Ok(())
}
