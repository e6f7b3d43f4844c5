//! microqr command-line entrypoint

use anyhow::Context;
use clap::Parser;
use microqr::{
    Delivery, EncodeRequest, ErrorCorrection, MicroQrConfig, MicroVersion, OutputFormat,
    RenderPipeline, RenderSpec, Sizing, TextStyle, logging,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

const EXAMPLES: &str = "\
Examples:
  microqr \"Hello\"                          # smallest Micro QR that fits, SVG on stdout
  microqr \"Tiny\" -v 2                      # force M2
  microqr \"12345\" --format text            # terminal rendering
  microqr \"Hello\" --format png -o qr.png   # written to qrcodes/qr.png
  microqr \"Hello\" --format png --size 240 -o /tmp/qr.png";

#[derive(Parser, Debug)]
#[command(
    name = "microqr",
    about = "Generate Micro QR Codes (M1-M4)",
    disable_version_flag = true,
    after_help = EXAMPLES
)]
struct Cli {
    /// Text data to encode
    #[arg(required_unless_present = "init_config")]
    data: Option<String>,

    /// Micro QR Code version (M1-M4), default: auto
    #[arg(short = 'v', long = "version", value_name = "1-4",
          value_parser = clap::value_parser!(u8).range(1..=4))]
    micro_version: Option<u8>,

    /// Error correction level: L=7%, M=15%, Q=25%, H=30% (default from config: L).
    /// The level is used exactly unless --boost-error is given.
    #[arg(short, long, value_enum)]
    error_correction: Option<ErrorCorrection>,

    /// Raise the error correction level as far as the chosen version allows (off by default)
    #[arg(long)]
    boost_error: bool,

    /// Output filename; relative names are placed in the configured output directory.
    /// Without it SVG and text go to stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format (default from config: svg)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Pixels per module (default from config: 8)
    #[arg(long, conflicts_with = "size")]
    scale: Option<u32>,

    /// Target edge length in pixels; resolved to the largest integer module scale that fits
    #[arg(long, value_name = "PIXELS")]
    size: Option<u32>,

    /// Border size in modules (default from config: 4)
    #[arg(long)]
    border: Option<u32>,

    /// Draw dark modules with block characters in text output
    #[arg(long)]
    invert: bool,

    /// Configuration file (toml/yaml/json). Defaults to microqr.{toml,yaml,json} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the built-in default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(path) = cli.init_config.as_deref() {
        MicroQrConfig::default()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let loaded = MicroQrConfig::load(cli.config.as_deref())?;
    logging::init(&loaded.config.logging)?;
    loaded.log();
    let config = loaded.config;

    let request = build_request(&cli, &config);
    let spec = build_spec(&cli, &config);
    info!(?request, ?spec, "Generating Micro QR code");

    let pipeline = RenderPipeline::from_config(&config);
    match pipeline.deliver(&request, &spec)? {
        Delivery::File { path, designator } => {
            println!(
                "{} Micro QR Code ({designator}) saved to {}",
                spec.format.label(),
                path.display()
            );
        }
        Delivery::Inline(rendered) => {
            if let Some(text) = rendered.artifact.as_text() {
                print!("{text}");
            }
        }
    }

    Ok(())
}

fn build_request(cli: &Cli, config: &MicroQrConfig) -> EncodeRequest {
    let mut request = EncodeRequest::new(cli.data.clone().unwrap_or_default())
        .with_error_correction(
            cli.error_correction
                .unwrap_or(config.defaults.error_correction),
        )
        .with_boost(cli.boost_error);
    // clap already restricted the range to 1..=4
    request.version = cli.micro_version.and_then(MicroVersion::new);
    request
}

fn build_spec(cli: &Cli, config: &MicroQrConfig) -> RenderSpec {
    let sizing = match (cli.size, cli.scale) {
        (Some(pixels), _) => Sizing::Pixels(pixels),
        (None, Some(scale)) => Sizing::Scale(scale),
        (None, None) => Sizing::Scale(config.defaults.scale),
    };

    RenderSpec {
        format: cli.format.unwrap_or(config.defaults.format),
        sizing,
        border: cli.border.unwrap_or(config.defaults.border),
        output: cli.output.clone(),
        text_style: if cli.invert {
            TextStyle::DarkInk
        } else {
            TextStyle::LightInk
        },
    }
}
