mod presets;
mod resize;
mod workflows;

use crate::cli::{Cli, Commands};
use headshot::HeadshotResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> HeadshotResult<()> {
    dispatch(cli.command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(command: Commands) -> HeadshotResult<()> {
    match command {
        Commands::Resize(cmd) => resize::run(cmd),
        Commands::Workflows => workflows::run(),
        Commands::Presets => presets::run(),
    }
}
