//! Encoded symbol matrix and its rendering primitives

use crate::error::RenderError;
use crate::qr::{ErrorCorrection, MicroVersion};
use image::{GrayImage, Luma};
use qrcode::{Color, QrCode, Version};
use std::fmt::Write as _;

/// Widest text rendering, in terminal columns
pub const MAX_TEXT_COLUMNS: usize = 200;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Which module colour is drawn with block characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    /// Light modules are inked; suits dark terminal backgrounds
    #[default]
    LightInk,
    /// Dark modules are inked; suits light backgrounds and printouts
    DarkInk,
}

/// An immutable Micro QR module matrix plus the parameters actually used
#[derive(Debug, Clone)]
pub struct Symbol {
    version: MicroVersion,
    error_correction: ErrorCorrection,
    width: usize,
    modules: Vec<bool>,
}

impl Symbol {
    /// Wrap an encoded code; `None` when it is not a Micro symbol
    pub(crate) fn from_code(code: QrCode) -> Option<Self> {
        let version = match code.version() {
            Version::Micro(n) => u8::try_from(n).ok().and_then(MicroVersion::new)?,
            Version::Normal(_) => return None,
        };

        Some(Self {
            version,
            error_correction: ErrorCorrection::from_ec_level(code.error_correction_level()),
            width: code.width(),
            modules: code
                .to_colors()
                .into_iter()
                .map(|c| c == Color::Dark)
                .collect(),
        })
    }

    /// Micro version of the symbol
    pub fn version(&self) -> MicroVersion {
        self.version
    }

    /// Error-correction level of the symbol
    pub fn error_correction(&self) -> ErrorCorrection {
        self.error_correction
    }

    /// Designator such as `M2-L`; M1 carries error detection only and is just `M1`
    pub fn designator(&self) -> String {
        if self.version.number() == 1 {
            self.version.to_string()
        } else {
            format!("{}-{}", self.version, self.error_correction)
        }
    }

    /// Modules per side, without border
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at `(x, y)` is dark
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Modules per side including a quiet zone of `border` modules
    pub fn unscaled_width(&self, border: u32) -> u32 {
        self.width as u32 + 2 * border
    }

    fn dark_with_border(&self, x: u32, y: u32, border: u32) -> bool {
        match (x.checked_sub(border), y.checked_sub(border)) {
            (Some(mx), Some(my)) => self.is_dark(mx as usize, my as usize),
            _ => false,
        }
    }

    /// Grayscale raster, `scale` pixels per module
    pub fn to_image(&self, scale: u32, border: u32) -> GrayImage {
        let scale = scale.max(1);
        let side = self.unscaled_width(border) * scale;

        GrayImage::from_fn(side, side, |x, y| {
            if self.dark_with_border(x / scale, y / scale, border) {
                DARK
            } else {
                LIGHT
            }
        })
    }

    /// Standalone SVG document, `scale` pixels per module
    pub fn to_svg(&self, scale: u32, border: u32) -> String {
        let modules = self.unscaled_width(border);
        let pixels = modules * scale.max(1);

        let mut path = String::new();
        for y in 0..self.width {
            for x in 0..self.width {
                if self.is_dark(x, y) {
                    let _ = write!(
                        path,
                        "M{},{}h1v1h-1z",
                        x as u32 + border,
                        y as u32 + border
                    );
                }
            }
        }

        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
                "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{px}\" height=\"{px}\" ",
                "viewBox=\"0 0 {m} {m}\" shape-rendering=\"crispEdges\">",
                "<rect width=\"{m}\" height=\"{m}\" fill=\"#fff\"/>",
                "<path fill=\"#000\" d=\"{d}\"/></svg>\n"
            ),
            px = pixels,
            m = modules,
            d = path
        )
    }

    /// Half-block text rendering, two module rows per line
    pub fn to_text(&self, border: u32, style: TextStyle) -> Result<String, RenderError> {
        let side = self.unscaled_width(border);
        let columns = side as usize;
        if columns > MAX_TEXT_COLUMNS {
            return Err(RenderError::TextRenderUnsupported {
                columns,
                max: MAX_TEXT_COLUMNS,
            });
        }

        let inked = |x: u32, y: u32| {
            y < side
                && match style {
                    TextStyle::LightInk => !self.dark_with_border(x, y, border),
                    TextStyle::DarkInk => self.dark_with_border(x, y, border),
                }
        };

        let mut out = String::with_capacity((columns + 1) * (columns / 2 + 1) * 3);
        for y in (0..side).step_by(2) {
            for x in 0..side {
                out.push(match (inked(x, y), inked(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
        }

        Ok(out)
    }
}
