//! potrace-cli: trace or posterize a raster image to SVG from the command
//! line, with optional JSON parameter/stat dumps for scripting.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin potrace-cli -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use potrace_core::{FillStrategy, PotraceOptions, RangeDistribution, Steps, TurnPolicy};

/// Trace or posterize a raster image to SVG.
#[derive(Parser)]
#[command(name = "potrace-cli", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Ambiguity-resolution rule for the contour walker.
    #[arg(long, value_enum, default_value_t = TurnPolicyArg::Minority)]
    turn_policy: TurnPolicyArg,

    /// Discard contours with `area <= turd_size`.
    #[arg(long, default_value_t = 2)]
    turd_size: u32,

    /// Corner threshold: `alpha >= alpha_max` forces a CORNER tag.
    #[arg(long, default_value_t = 1.0)]
    alpha_max: f64,

    /// Disable curve-merge optimization after smoothing.
    #[arg(long)]
    no_opt_curve: bool,

    /// Maximum perpendicular error tolerated by curve optimization.
    #[arg(long, default_value_t = 0.2)]
    opt_tolerance: f64,

    /// Fixed threshold in `[0, 255]`; omit for automatic thresholding.
    #[arg(long)]
    threshold: Option<u8>,

    /// Trace light shapes on a dark background instead of the default.
    #[arg(long)]
    white_on_black: bool,

    /// Path fill colour.
    #[arg(long)]
    color: Option<String>,

    /// Background rect colour, or omit for a transparent canvas.
    #[arg(long)]
    background: Option<String>,

    /// Output viewport width (scales the path data); defaults to the image
    /// width.
    #[arg(long)]
    width: Option<u32>,

    /// Output viewport height; defaults to the image height.
    #[arg(long)]
    height: Option<u32>,

    /// Write SVG output to this file instead of stdout.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Run the multi-layer posterizer instead of a single trace.
    #[arg(long)]
    posterize: bool,

    /// Posterizer step count; omit for automatic selection.
    #[arg(long)]
    steps: Option<u8>,

    /// Posterizer layer-opacity derivation strategy.
    #[arg(long, value_enum, default_value_t = FillStrategyArg::Spread)]
    fill_strategy: FillStrategyArg,

    /// Posterizer automatic-threshold spread.
    #[arg(long, value_enum, default_value_t = RangeDistributionArg::Auto)]
    range_distribution: RangeDistributionArg,

    /// Print the resolved parameters as JSON to stdout instead of the SVG.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TurnPolicyArg {
    Black,
    White,
    Left,
    Right,
    Majority,
    Minority,
}

impl From<TurnPolicyArg> for TurnPolicy {
    fn from(value: TurnPolicyArg) -> Self {
        match value {
            TurnPolicyArg::Black => Self::Black,
            TurnPolicyArg::White => Self::White,
            TurnPolicyArg::Left => Self::Left,
            TurnPolicyArg::Right => Self::Right,
            TurnPolicyArg::Majority => Self::Majority,
            TurnPolicyArg::Minority => Self::Minority,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FillStrategyArg {
    Spread,
    Dominant,
    Mean,
    Median,
}

impl From<FillStrategyArg> for FillStrategy {
    fn from(value: FillStrategyArg) -> Self {
        match value {
            FillStrategyArg::Spread => Self::Spread,
            FillStrategyArg::Dominant => Self::Dominant,
            FillStrategyArg::Mean => Self::Mean,
            FillStrategyArg::Median => Self::Median,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RangeDistributionArg {
    Auto,
    Equal,
}

impl From<RangeDistributionArg> for RangeDistribution {
    fn from(value: RangeDistributionArg) -> Self {
        match value {
            RangeDistributionArg::Auto => Self::Auto,
            RangeDistributionArg::Equal => Self::Equal,
        }
    }
}

impl Cli {
    fn trace_options(&self) -> PotraceOptions {
        PotraceOptions {
            turn_policy: self.turn_policy.into(),
            turd_size: self.turd_size,
            alpha_max: self.alpha_max,
            opt_curve: !self.no_opt_curve,
            opt_tolerance: self.opt_tolerance,
            threshold: self.threshold,
            black_on_white: !self.white_on_black,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Image: {} ({} bytes)", cli.image_path.display(), image_bytes.len());

    if cli.posterize {
        run_posterize(&cli, &image_bytes)
    } else {
        run_trace(&cli, &image_bytes)
    }
}

fn run_trace(cli: &Cli, image_bytes: &[u8]) -> ExitCode {
    let mut engine = potrace_core::Potrace::new();

    if let Err(e) = engine.set_parameters(cli.trace_options()) {
        eprintln!("Invalid parameters: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = engine.load_image(image_bytes) {
        eprintln!("Error decoding image: {e}");
        return ExitCode::FAILURE;
    }
    let trace = match engine.process() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Tracing failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Traced {} contour(s), {}x{}", trace.paths.len(), trace.width, trace.height);

    if cli.json {
        let summary = serde_json::json!({
            "width": trace.width,
            "height": trace.height,
            "contours": trace.paths.len(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let svg = potrace_svg::get_svg(
        trace,
        cli.width,
        cli.height,
        cli.background.as_deref(),
        cli.color.as_deref(),
    );
    write_output(&svg, cli.svg.as_ref())
}

fn run_posterize(cli: &Cli, image_bytes: &[u8]) -> ExitCode {
    let (_, _, bitmap) = match potrace_core::ingest::decode(image_bytes) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error decoding image: {e}");
            return ExitCode::FAILURE;
        }
    };

    let steps = cli.steps.map_or(Steps::Auto, Steps::Count);
    let options = potrace_core::PosterizerOptions {
        trace: cli.trace_options(),
        steps,
        fill_strategy: cli.fill_strategy.into(),
        range_distribution: cli.range_distribution.into(),
    };
    let posterizer = potrace_core::Posterizer::new(options);
    let result = match posterizer.trace(&bitmap) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Posterizing failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Posterized {} layer(s), {}x{}", result.layers.len(), result.width, result.height);

    if cli.json {
        let summary = serde_json::json!({
            "width": result.width,
            "height": result.height,
            "layers": result
                .layers
                .iter()
                .map(|l| serde_json::json!({ "threshold": l.threshold, "opacity": l.opacity }))
                .collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let svg = potrace_svg::posterizer_to_svg(&result, cli.background.as_deref(), cli.color.as_deref());
    write_output(&svg, cli.svg.as_ref())
}

fn write_output(svg: &str, path: Option<&PathBuf>) -> ExitCode {
    match path {
        Some(path) => match std::fs::write(path, svg) {
            Ok(()) => {
                eprintln!("SVG written to {} ({} bytes)", path.display(), svg.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error writing SVG to {}: {e}", path.display());
                ExitCode::FAILURE
            }
        },
        None => {
            println!("{svg}");
            ExitCode::SUCCESS
        }
    }
}
