use headshot::HeadshotResult;
use headshot::presets::{BACKGROUND_PRESETS, SIZE_PRESETS};

/// Print the size presets as `--size` values and the background presets as `--background` values.
pub fn run() -> HeadshotResult<()> {
    println!("Sizes:");
    for preset in SIZE_PRESETS {
        let size = format!("{}x{}", preset.width, preset.height);
        println!("  {size:<11} {}", preset.label);
    }
    println!();
    println!("Backgrounds:");
    for preset in BACKGROUND_PRESETS {
        println!("  {:<26} {}", preset.spec, preset.label);
    }
    Ok(())
}
