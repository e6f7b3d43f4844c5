//! Render pipeline: encode, resolve scale, produce raster / vector / text output

mod scale;

pub use scale::{DEFAULT_MAX_SCALE, ScaleResolution, resolve_scale};

use crate::config::MicroQrConfig;
use crate::error::{ConfigError, RenderError, Result};
use crate::output::resolve_path;
use crate::qr::{EncodeRequest, MicroQrEncoder, Symbol, TextStyle};
use clap::ValueEnum;
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Widest accepted quiet zone, in modules
pub const MAX_BORDER: u32 = 100;

/// Output format of a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG raster
    #[default]
    #[serde(alias = "raster")]
    #[value(alias = "raster")]
    Png,
    /// SVG vector
    #[serde(alias = "vector")]
    #[value(alias = "vector")]
    Svg,
    /// Unicode block characters
    #[serde(alias = "txt")]
    #[value(alias = "txt")]
    Text,
}

impl OutputFormat {
    /// Human label used in messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
            Self::Text => "Text",
        }
    }

    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Text => "txt",
        }
    }

    /// Whether the format can only be delivered as a file (or to an in-memory consumer)
    pub fn requires_file(self) -> bool {
        matches!(self, Self::Png)
    }
}

/// How the output size is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Target edge length in pixels; resolved to an integer module scale
    Pixels(u32),
    /// Explicit pixels per module
    Scale(u32),
}

/// Rendering parameters for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    /// Output format
    pub format: OutputFormat,
    /// Size selection; ignored for text
    pub sizing: Sizing,
    /// Quiet zone in modules
    pub border: u32,
    /// Requested destination, if any
    pub output: Option<PathBuf>,
    /// Ink choice for text output
    pub text_style: TextStyle,
}

impl RenderSpec {
    /// In-memory spec with the given format and sizing
    pub fn new(format: OutputFormat, sizing: Sizing, border: u32) -> Self {
        Self {
            format,
            sizing,
            border,
            output: None,
            text_style: TextStyle::default(),
        }
    }

    /// Attach a destination filename
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.border > MAX_BORDER {
            return Err(ConfigError::Invalid(format!(
                "border of {} modules exceeds the maximum of {MAX_BORDER}",
                self.border
            ))
            .into());
        }

        if self.format != OutputFormat::Text {
            match self.sizing {
                Sizing::Pixels(0) => {
                    return Err(ConfigError::Invalid("pixel size must be at least 1".into()).into());
                }
                Sizing::Scale(0) => {
                    return Err(ConfigError::Invalid("scale must be at least 1".into()).into());
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Rendered output held in memory
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Grayscale raster image
    Raster(GrayImage),
    /// SVG document
    Vector(String),
    /// Terminal text
    Text(String),
}

impl Artifact {
    /// Serialised file contents (PNG bytes for rasters)
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, RenderError> {
        match self {
            Artifact::Raster(image) => {
                let mut bytes = Vec::new();
                image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
                Ok(bytes)
            }
            Artifact::Vector(svg) => Ok(svg.clone().into_bytes()),
            Artifact::Text(text) => Ok(text.clone().into_bytes()),
        }
    }

    /// Write the artifact to `path`
    pub fn write_to(&self, path: &Path) -> std::result::Result<(), RenderError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Textual content for formats that have one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Raster(_) => None,
            Artifact::Vector(s) | Artifact::Text(s) => Some(s),
        }
    }
}

/// A finished render
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Designator of the encoded symbol, e.g. `M2-L`
    pub designator: String,
    /// Per-module scale used; `None` for text
    pub scale: Option<u32>,
    /// The output itself
    pub artifact: Artifact,
}

/// Where a delivered render ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Written to a file
    File {
        /// Final path
        path: PathBuf,
        /// Designator of the encoded symbol
        designator: String,
    },
    /// Returned for the caller to print
    Inline(Rendered),
}

/// Drives the encoder and rendering primitives for one request at a time
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    encoder: MicroQrEncoder,
    max_scale: u32,
    output_dir: PathBuf,
}

impl RenderPipeline {
    /// Pipeline writing relative filenames under `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoder: MicroQrEncoder::new(),
            max_scale: DEFAULT_MAX_SCALE,
            output_dir: output_dir.into(),
        }
    }

    /// Pipeline configured from the loaded settings
    pub fn from_config(config: &MicroQrConfig) -> Self {
        Self::new(&config.paths.output_directory).with_max_scale(config.defaults.max_scale)
    }

    /// Override the upper bound of the module scale
    pub fn with_max_scale(mut self, max_scale: u32) -> Self {
        self.max_scale = max_scale.max(1);
        self
    }

    /// Directory relative output names are resolved against
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Encode and render in memory.
    ///
    /// Raster output is allowed here because the caller consumes it directly.
    pub fn render(&self, request: &EncodeRequest, spec: &RenderSpec) -> Result<Rendered> {
        spec.validate()?;

        let symbol = self.encoder.encode(request)?;
        self.render_symbol(&symbol, spec)
    }

    fn render_symbol(&self, symbol: &Symbol, spec: &RenderSpec) -> Result<Rendered> {
        let designator = symbol.designator();

        let (scale, artifact) = match spec.format {
            OutputFormat::Text => (None, Artifact::Text(symbol.to_text(spec.border, spec.text_style)?)),
            OutputFormat::Png => {
                let scale = self.module_scale(symbol, spec);
                (Some(scale), Artifact::Raster(symbol.to_image(scale, spec.border)))
            }
            OutputFormat::Svg => {
                let scale = self.module_scale(symbol, spec);
                (Some(scale), Artifact::Vector(symbol.to_svg(scale, spec.border)))
            }
        };

        tracing::debug!(%designator, ?scale, border = spec.border, format = spec.format.label(), "Rendered symbol");

        Ok(Rendered {
            designator,
            scale,
            artifact,
        })
    }

    fn module_scale(&self, symbol: &Symbol, spec: &RenderSpec) -> u32 {
        match spec.sizing {
            Sizing::Pixels(pixels) => {
                resolve_scale(pixels, symbol.unscaled_width(spec.border), self.max_scale)
                    .per_module_scale
            }
            Sizing::Scale(scale) => scale.clamp(1, self.max_scale),
        }
    }

    /// Render for a file-based caller: write to the resolved path, or hand
    /// the artifact back when no destination was given.
    pub fn deliver(&self, request: &EncodeRequest, spec: &RenderSpec) -> Result<Delivery> {
        if spec.output.is_none() && spec.format.requires_file() {
            return Err(ConfigError::MissingOutputPath(spec.format.label()).into());
        }

        let rendered = self.render(request, spec)?;

        match resolve_path(spec.output.as_deref(), &self.output_dir)? {
            Some(path) => {
                rendered.artifact.write_to(&path)?;
                tracing::info!(path = %path.display(), designator = %rendered.designator, "Saved Micro QR code");
                Ok(Delivery::File {
                    path,
                    designator: rendered.designator,
                })
            }
            None => Ok(Delivery::Inline(rendered)),
        }
    }
}
