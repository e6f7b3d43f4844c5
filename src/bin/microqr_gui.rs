//! microqr desktop form entrypoint

use clap::Parser;
use microqr::{MicroQrConfig, logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "microqr-gui", version, about = "Micro QR Code generator with live preview")]
struct Cli {
    /// Configuration file (toml/yaml/json). Defaults to microqr.{toml,yaml,json} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = MicroQrConfig::load(cli.config.as_deref())?;
    logging::init(&loaded.config.logging)?;
    loaded.log();
    let config = loaded.config;
    tracing::info!(theme = ?config.ui.theme, "Starting Micro QR form");

    microqr::gui::run(config).map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
