//! Content cipher: XChaCha20-Poly1305 with a detached tag.
//!
//! Used both for the message body (keyed by the CEK) and for wrapping the CEK
//! itself (keyed by a per-recipient KEK, empty associated data).

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{Tag, XChaCha20Poly1305, XNonce};

use super::random_bytes;
use crate::error::{JweError, Result};

/// JOSE name of this content encryption algorithm.
pub const XC20P: &str = "XC20P";

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;

/// XChaCha20 nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Output of a single seal: ciphertext, detached tag, and the nonce used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
    pub iv: [u8; NONCE_SIZE],
}

/// Seal `plaintext` under `key` with a freshly drawn random nonce.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<SealedBox> {
    let iv: [u8; NONCE_SIZE] = random_bytes();
    let (ciphertext, tag) = seal_with_nonce(key, &iv, plaintext, aad)?;
    Ok(SealedBox {
        ciphertext,
        tag,
        iv,
    })
}

/// Seal with a caller-chosen nonce. The nonce must never repeat under one key.
pub fn seal_with_nonce(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_SIZE])> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(nonce), aad, &mut buffer)
        .map_err(|_| JweError::Encryption)?;
    let mut detached = [0u8; TAG_SIZE];
    detached.copy_from_slice(&tag);
    Ok((buffer, detached))
}

/// Authenticate and decrypt.
///
/// Any failure is reported as [`JweError::DecryptionFailed`] and no partial
/// plaintext is ever returned.
pub fn open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(XNonce::from_slice(nonce), aad, &mut buffer, Tag::from_slice(tag))
        .map_err(|_| JweError::DecryptionFailed)?;
    Ok(buffer)
}
