use crate::util::b64url_encode;

/// First 8 characters of the base64url public key, for display.
pub fn short_fingerprint(public_key: &[u8; 32]) -> String {
    let encoded = b64url_encode(public_key);
    encoded[..8].to_string()
}
