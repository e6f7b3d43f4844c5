//! Error types for microqr operations

use std::io;
use thiserror::Error;

/// Result type alias using microqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for microqr operations
#[derive(Error, Debug)]
pub enum Error {
    /// The data could not be encoded as a Micro QR symbol
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The symbol could not be rendered or written
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Invalid or incomplete configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures raised by the encoder adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The requested version / error-correction combination cannot hold the data
    #[error("Unsupported Micro QR parameters: {0}")]
    UnsupportedParameters(String),

    /// The data does not fit any Micro QR version
    #[error("Data too long for a Micro QR code: {0}")]
    DataTooLong(String),
}

/// Failures raised while producing or writing an artifact
#[derive(Error, Debug)]
pub enum RenderError {
    /// The symbol cannot be drawn with terminal characters
    #[error("Symbol cannot be rendered as text: {columns} columns exceeds the {max} column limit")]
    TextRenderUnsupported {
        /// Width the text rendering would need
        columns: usize,
        /// Widest supported text rendering
        max: usize,
    },

    /// Encoding or writing the output failed
    #[error("I/O failure: {0}")]
    IoFailure(#[from] io::Error),
}

/// Failures caused by user-supplied settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A format that must be written to a file was requested without a destination
    #[error("{0} output requires an output filename (-o)")]
    MissingOutputPath(&'static str),

    /// Any other invalid setting or unreadable configuration document
    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => RenderError::IoFailure(io),
            other => RenderError::IoFailure(io::Error::other(other)),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Render(e.into())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Render(RenderError::IoFailure(e))
    }
}

impl Error {
    /// Short classification used in status lines and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Encode(EncodeError::UnsupportedParameters(_)) => "unsupported_parameters",
            Error::Encode(EncodeError::DataTooLong(_)) => "data_too_long",
            Error::Render(RenderError::TextRenderUnsupported { .. }) => "text_render_unsupported",
            Error::Render(RenderError::IoFailure(_)) => "io_failure",
            Error::Config(ConfigError::MissingOutputPath(_)) => "missing_output_path",
            Error::Config(ConfigError::Invalid(_)) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_io_error_maps_to_io_failure() {
        let err: Error = image::ImageError::IoError(io::Error::other("disk full")).into();
        assert_eq!(err.kind(), "io_failure");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_missing_output_path_message() {
        let err: Error = ConfigError::MissingOutputPath("PNG").into();
        assert_eq!(err.to_string(), "PNG output requires an output filename (-o)");
    }
}
