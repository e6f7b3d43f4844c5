//! Micro QR encoder adapter

use crate::error::EncodeError;
use crate::qr::{EncodeRequest, ErrorCorrection, MicroVersion, Symbol};
use qrcode::QrCode;
use qrcode::types::QrError;

/// Encoder restricted to Micro QR versions
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroQrEncoder;

impl MicroQrEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self
    }

    /// Encode the request into a fresh symbol.
    ///
    /// A forced version is honoured exactly; any failure there becomes
    /// [`EncodeError::UnsupportedParameters`]. Without a forced version the
    /// smallest Micro version that fits is chosen.
    pub fn encode(&self, request: &EncodeRequest) -> Result<Symbol, EncodeError> {
        if request.data.is_empty() {
            return Err(EncodeError::UnsupportedParameters(
                "data must not be empty".to_string(),
            ));
        }

        let code = match request.version {
            Some(version) => self.encode_version(request, version)?,
            None => self.encode_auto(request)?,
        };

        let code = if request.boost_error {
            boost(&request.data, code)
        } else {
            code
        };

        let symbol = Symbol::from_code(code).ok_or_else(|| {
            EncodeError::DataTooLong(format!(
                "{} bytes only fit a full-size QR code",
                request.data.len()
            ))
        })?;

        tracing::debug!(
            designator = %symbol.designator(),
            width = symbol.width(),
            length = request.data.len(),
            "Encoded Micro QR symbol"
        );

        Ok(symbol)
    }

    fn encode_version(
        &self,
        request: &EncodeRequest,
        version: MicroVersion,
    ) -> Result<QrCode, EncodeError> {
        QrCode::with_version(
            request.data.as_bytes(),
            version.to_version(),
            request.error_correction.to_ec_level(),
        )
        .map_err(|e| {
            EncodeError::UnsupportedParameters(format!(
                "cannot build {version}-{} for this data: {e}",
                request.error_correction
            ))
        })
    }

    fn encode_auto(&self, request: &EncodeRequest) -> Result<QrCode, EncodeError> {
        let level = request.error_correction.to_ec_level();
        let mut capacity_exceeded = false;
        let mut last_error = None;

        for version in MicroVersion::ALL {
            match QrCode::with_version(request.data.as_bytes(), version.to_version(), level) {
                Ok(code) => return Ok(code),
                Err(e) => {
                    tracing::trace!(%version, error = %e, "Micro version rejected");
                    capacity_exceeded |= matches!(e, QrError::DataTooLong);
                    last_error = Some(e);
                }
            }
        }

        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        if capacity_exceeded {
            Err(EncodeError::DataTooLong(format!(
                "{} bytes exceed every Micro version at level {} ({detail})",
                request.data.len(),
                request.error_correction
            )))
        } else {
            Err(EncodeError::UnsupportedParameters(format!(
                "no Micro version supports this data at level {} ({detail})",
                request.error_correction
            )))
        }
    }
}

/// Re-encode at the strongest level that keeps the chosen version.
fn boost(data: &str, code: QrCode) -> QrCode {
    let version = code.version();
    let current = ErrorCorrection::from_ec_level(code.error_correction_level());

    ErrorCorrection::ALL
        .into_iter()
        .rev()
        .filter(|level| *level > current)
        .find_map(|level| QrCode::with_version(data.as_bytes(), version, level.to_ec_level()).ok())
        .unwrap_or(code)
}
