//! microqr - Micro QR (M1-M4) generator
//!
//! This library encodes short text into Micro QR symbols and renders them as
//! PNG, SVG or terminal text. It backs both the `microqr` command-line tool
//! and the `microqr-gui` desktop form.
//!
//! # Features
//!
//! - **Micro only**: automatic version selection never falls back to a full-size QR code
//! - **Crisp output**: pixel sizes resolve to an integer per-module scale
//! - **Live preview**: a debounced controller collapses bursts of form edits
//!
//! # Example
//!
//! ```no_run
//! use microqr::{EncodeRequest, OutputFormat, RenderPipeline, RenderSpec, Sizing};
//!
//! fn main() -> microqr::Result<()> {
//!     let pipeline = RenderPipeline::new("qrcodes");
//!     let spec = RenderSpec::new(OutputFormat::Png, Sizing::Pixels(240), 1).with_output("hello.png");
//!
//!     pipeline.deliver(&EncodeRequest::new("HELLO"), &spec)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod preview;
pub mod qr;
pub mod render;

#[cfg(feature = "gui")]
#[cfg_attr(docsrs, doc(cfg(feature = "gui")))]
pub mod gui;

// Re-exports for convenience
pub use error::{ConfigError, EncodeError, Error, RenderError, Result};

pub use config::{LoadedConfig, LogRotation, LoggingOptions, MicroQrConfig};
pub use preview::{PreviewController, PreviewEvent, PreviewParams, PreviewRenderer};
pub use qr::{EncodeRequest, ErrorCorrection, MicroQrEncoder, MicroVersion, Symbol, TextStyle};
pub use render::{
    Artifact, Delivery, OutputFormat, RenderPipeline, RenderSpec, Rendered, Sizing, resolve_scale,
};
