//! Micro QR encoding
//!
//! This module wraps the `qrcode` crate behind a Micro-only contract:
//! every successful encode yields an M1-M4 symbol, never a full-size QR code.

mod encoder;
mod symbol;

pub use encoder::MicroQrEncoder;
pub use symbol::{MAX_TEXT_COLUMNS, Symbol, TextStyle};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error-correction level requested from the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize, ValueEnum)]
pub enum ErrorCorrection {
    /// ~7% recovery
    #[default]
    #[serde(rename = "L", alias = "l")]
    #[value(name = "L", alias = "l")]
    Low,
    /// ~15% recovery
    #[serde(rename = "M", alias = "m")]
    #[value(name = "M", alias = "m")]
    Medium,
    /// ~25% recovery (M4 only)
    #[serde(rename = "Q", alias = "q")]
    #[value(name = "Q", alias = "q")]
    Quartile,
    /// ~30% recovery (not available for Micro QR)
    #[serde(rename = "H", alias = "h")]
    #[value(name = "H", alias = "h")]
    High,
}

impl ErrorCorrection {
    /// All levels, weakest first
    pub const ALL: [ErrorCorrection; 4] = [Self::Low, Self::Medium, Self::Quartile, Self::High];

    /// Single-letter designator suffix
    pub fn letter(self) -> char {
        match self {
            Self::Low => 'L',
            Self::Medium => 'M',
            Self::Quartile => 'Q',
            Self::High => 'H',
        }
    }

    pub(crate) fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            Self::Low => qrcode::EcLevel::L,
            Self::Medium => qrcode::EcLevel::M,
            Self::Quartile => qrcode::EcLevel::Q,
            Self::High => qrcode::EcLevel::H,
        }
    }

    pub(crate) fn from_ec_level(level: qrcode::EcLevel) -> Self {
        match level {
            qrcode::EcLevel::L => Self::Low,
            qrcode::EcLevel::M => Self::Medium,
            qrcode::EcLevel::Q => Self::Quartile,
            qrcode::EcLevel::H => Self::High,
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A Micro QR version number, M1 through M4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MicroVersion(u8);

impl MicroVersion {
    /// All Micro versions, smallest first
    pub const ALL: [MicroVersion; 4] = [Self(1), Self(2), Self(3), Self(4)];

    /// Build a version from its number, `None` outside 1..=4
    pub fn new(number: u8) -> Option<Self> {
        (1..=4).contains(&number).then_some(Self(number))
    }

    /// The version number (1-4)
    pub fn number(self) -> u8 {
        self.0
    }

    pub(crate) fn to_version(self) -> qrcode::Version {
        qrcode::Version::Micro(i16::from(self.0))
    }
}

impl TryFrom<u8> for MicroVersion {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("Micro QR version must be 1-4, got {value}"))
    }
}

impl From<MicroVersion> for u8 {
    fn from(version: MicroVersion) -> Self {
        version.0
    }
}

impl fmt::Display for MicroVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Parameters for one encode call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodeRequest {
    /// Text to encode
    pub data: String,
    /// Exact Micro version to use; `None` picks the smallest that fits
    pub version: Option<MicroVersion>,
    /// Requested error-correction level
    pub error_correction: ErrorCorrection,
    /// Raise the level as far as the chosen version allows
    pub boost_error: bool,
}

impl EncodeRequest {
    /// Auto-version request at level L
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            version: None,
            error_correction: ErrorCorrection::default(),
            boost_error: false,
        }
    }

    /// Force a specific Micro version
    pub fn with_version(mut self, version: MicroVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the error-correction level
    pub fn with_error_correction(mut self, level: ErrorCorrection) -> Self {
        self.error_correction = level;
        self
    }

    /// Enable error-correction boosting
    pub fn with_boost(mut self, boost: bool) -> Self {
        self.boost_error = boost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micro_version_bounds() {
        assert!(MicroVersion::new(0).is_none());
        assert!(MicroVersion::new(5).is_none());
        assert_eq!(MicroVersion::new(3).map(MicroVersion::number), Some(3));
        assert_eq!(MicroVersion::ALL[1].to_string(), "M2");
    }

    #[test]
    fn test_error_correction_serde_letters() {
        let level: ErrorCorrection = serde_json::from_str("\"q\"").unwrap();
        assert_eq!(level, ErrorCorrection::Quartile);
        assert_eq!(serde_json::to_string(&ErrorCorrection::Medium).unwrap(), "\"M\"");
    }

    #[test]
    fn test_micro_version_rejects_out_of_range_in_config() {
        assert!(serde_json::from_str::<MicroVersion>("7").is_err());
        assert_eq!(serde_json::from_str::<MicroVersion>("4").unwrap().number(), 4);
    }
}
