//! Shared encoding helpers.
//!
//! Every binary field on the wire uses the URL-safe base64 alphabet without
//! padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{JweError, Result};

/// Encode bytes as unpadded base64url.
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64url field.
///
/// `field` names the envelope member for the structural error message.
pub fn b64url_decode(value: &str, field: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| JweError::InvalidEnvelope(format!("{} is not valid base64url: {}", field, e)))
}

/// Decode a base64url field that must hold exactly `N` bytes.
pub fn b64url_decode_array<const N: usize>(value: &str, field: &str) -> Result<[u8; N]> {
    let bytes = b64url_decode(value, field)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        JweError::InvalidEnvelope(format!(
            "{} must be {} bytes, got {}",
            field,
            N,
            v.len()
        ))
    })
}
