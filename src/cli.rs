use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use headshot::{BackgroundSpec, ENV_MODEL_DIR, OutputFormat, PlacementMode};
use image::imageops::FilterType;

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Log more detail to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize every image in a folder, optionally replacing the background
    Resize(ResizeCommand),
    /// List the background removal workflows
    Workflows,
    /// List common canvas sizes and background presets
    Presets,
}

/// Resampling filters for image resizing.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    /// Convert ResampleFilter to image::imageops::FilterType.
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Crop the overflow evenly from both sides
    Center,
    /// Crop from the bottom, keeping heads in frame
    Top,
    /// Fit the whole image and pad with the background
    Fill,
}

impl From<ModeArg> for PlacementMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Center => PlacementMode::Center,
            ModeArg::Top => PlacementMode::Top,
            ModeArg::Fill => PlacementMode::Fill,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Jpeg,
    Png,
    Webp,
}

#[derive(Args, Debug)]
pub struct ResizeCommand {
    /// Folder holding the source images
    pub input: PathBuf,
    /// Folder the resized images are written to
    pub output: PathBuf,
    /// Canvas size as WIDTHxHEIGHT, e.g. 500x500
    #[arg(
        long,
        value_parser = parse_size,
        conflicts_with_all = ["width", "height"],
        required_unless_present_all = ["width", "height"]
    )]
    pub size: Option<(u32, u32)>,
    /// Canvas width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<u32>,
    /// Canvas height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<u32>,
    /// How images are mapped onto the canvas
    #[arg(long, value_enum, default_value_t = ModeArg::Top)]
    pub mode: ModeArg,
    /// Output file format
    #[arg(long, value_enum, default_value_t = FormatArg::Jpeg)]
    pub format: FormatArg,
    /// JPEG quality
    #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(50..=100))]
    pub quality: u8,
    /// Background behind cut-out subjects: `#RRGGBB`, `#A:#B[:#C...][:down|right|diagonal|radial]`,
    /// an image path, or `TRANSPARENT`
    #[arg(long, default_value = "#FFFFFF", value_parser = parse_background)]
    pub background: BackgroundSpec,
    /// Background removal workflow to run (repeatable); none means resize only
    #[arg(short = 'w', long = "workflow", value_name = "KEY")]
    pub workflows: Vec<String>,
    /// Folder holding `<model>.onnx` files
    #[arg(long, env = ENV_MODEL_DIR, default_value = "models")]
    pub model_dir: PathBuf,
    /// Intra-op thread count for ORT (None to let ORT decide)
    #[arg(long)]
    pub intra_threads: Option<usize>,
    /// Filter used when resizing images onto the canvas
    #[arg(long = "resample-filter", value_enum, default_value_t = ResampleFilter::Lanczos3)]
    pub resample_filter: ResampleFilter,
}

impl ResizeCommand {
    pub fn dimensions(&self) -> (u32, u32) {
        self.size
            .unwrap_or((self.width.unwrap_or(0), self.height.unwrap_or(0)))
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            FormatArg::Jpeg => OutputFormat::Jpeg {
                quality: self.quality,
            },
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Webp => OutputFormat::WebP,
        }
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must look like 500x500, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| format!("`{part}` is not a positive pixel count"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn parse_background(value: &str) -> Result<BackgroundSpec, String> {
    headshot::background::parse_strict(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_both_axes() {
        assert_eq!(parse_size("500x400"), Ok((500, 400)));
        assert_eq!(parse_size("1080X1350"), Ok((1080, 1350)));
        assert!(parse_size("500").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn background_rejects_garbage() {
        assert!(parse_background("#1D4BB7:#DFE7EF:radial").is_ok());
        assert!(parse_background("not-a-color").is_err());
    }

    #[test]
    fn resize_accepts_width_and_height() {
        let cli = Cli::try_parse_from([
            "headshot", "resize", "in", "out", "--width", "300", "--height", "200", "-w",
            "portrait", "-w", "bria",
        ])
        .unwrap();
        let Commands::Resize(cmd) = cli.command else {
            panic!("expected resize")
        };
        assert_eq!(cmd.dimensions(), (300, 200));
        assert_eq!(cmd.workflows, vec!["portrait", "bria"]);
        assert_eq!(cmd.output_format(), OutputFormat::Jpeg { quality: 95 });
    }

    #[test]
    fn resize_requires_a_size() {
        assert!(Cli::try_parse_from(["headshot", "resize", "in", "out"]).is_err());
        assert!(
            Cli::try_parse_from(["headshot", "resize", "in", "out", "--size", "1x1", "--width", "2"])
                .is_err()
        );
    }
}
