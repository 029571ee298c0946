//! Envelope construction.
//!
//! One CEK and one content seal per envelope, however many recipients there
//! are. Each encrypter only ever sees the CEK and returns its own entry.

use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use super::{content_aad, Jwe, ProtectedHeader};
use crate::crypto::aead::{self, XC20P};
use crate::crypto::random_bytes;
use crate::error::{JweError, Result};
use crate::keywrap::{ContentKey, Encrypter, DIR};
use crate::util::b64url_encode;

/// Encrypt `plaintext` for every encrypter in `encrypters`.
///
/// `protected` supplies passthrough fields for the protected header; it is
/// read, never modified. `aad` is bound to the content but not encrypted.
///
/// Usage errors (`NoEncrypters`, `IncompatibleEncrypters`,
/// `DirectRequiresSingleRecipient`, `UnsupportedEncryption`) are reported
/// before any key material is generated.
pub fn encrypt(
    plaintext: &[u8],
    encrypters: &[&dyn Encrypter],
    protected: Option<&ProtectedHeader>,
    aad: Option<&[u8]>,
) -> Result<Jwe> {
    encrypt_with_cek(plaintext, encrypters, protected, aad).map(|(jwe, _)| jwe)
}

/// Like [`encrypt`], but also hands the CEK back to the caller.
pub fn encrypt_with_cek(
    plaintext: &[u8],
    encrypters: &[&dyn Encrypter],
    protected: Option<&ProtectedHeader>,
    aad: Option<&[u8]>,
) -> Result<(Jwe, ContentKey)> {
    // ── 1. Usage checks ──
    let first = encrypters.first().ok_or(JweError::NoEncrypters)?;
    let enc = first.enc();
    if encrypters.iter().any(|e| e.enc() != enc) {
        return Err(JweError::IncompatibleEncrypters);
    }
    let direct = encrypters.iter().any(|e| e.direct_key().is_some());
    if direct && encrypters.len() > 1 {
        return Err(JweError::DirectRequiresSingleRecipient);
    }
    if enc != XC20P {
        return Err(JweError::UnsupportedEncryption(enc.to_string()));
    }

    // ── 2. Content key ──
    let cek: ContentKey = match first.direct_key() {
        Some(key) => Zeroizing::new(*key),
        None => Zeroizing::new(random_bytes()),
    };

    // ── 3. Protected header ──
    let skid = match encrypters {
        [only] => only.skid(),
        _ => None,
    };
    let header = compose_header(protected, enc, direct, skid);
    let header_json = serde_json::to_vec(&header).map_err(|_| JweError::Encryption)?;
    let protected = b64url_encode(header_json);

    // ── 4. Seal the content once ──
    let aad = aad.map(|aad| b64url_encode(aad));
    let sealed = aead::seal(&cek, plaintext, &content_aad(&protected, aad.as_deref()))?;

    // ── 5. Wrap the CEK per recipient ──
    let mut recipients = if direct {
        Vec::new()
    } else {
        encrypters
            .iter()
            .map(|e| e.wrap_cek(&cek))
            .collect::<Result<Vec<_>>>()?
    };

    debug!(
        recipients = encrypters.len(),
        algs = ?encrypters.iter().map(|e| e.alg()).collect::<Vec<_>>(),
        aad = aad.is_some(),
        "built envelope"
    );

    // ── 6. Assemble ──
    let mut jwe = Jwe {
        protected,
        aad,
        iv: b64url_encode(sealed.iv),
        ciphertext: b64url_encode(&sealed.ciphertext),
        tag: b64url_encode(sealed.tag),
        encrypted_key: None,
        header: None,
        recipients: None,
    };
    match recipients.len() {
        0 => {}
        1 => {
            if let Some(only) = recipients.pop() {
                jwe.encrypted_key = Some(only.encrypted_key);
                jwe.header = Some(only.header);
            }
        }
        _ => jwe.recipients = Some(recipients),
    }
    Ok((jwe, cek))
}

/// Caller fields first, computed fields on top, in a fresh map.
///
/// A caller `alg` never survives: key-wrapped envelopes carry `alg` per
/// recipient, and direct envelopes get `"dir"`.
fn compose_header(
    caller: Option<&ProtectedHeader>,
    enc: &str,
    direct: bool,
    skid: Option<&str>,
) -> ProtectedHeader {
    let mut header: ProtectedHeader = caller
        .into_iter()
        .flatten()
        .filter(|(name, _)| name.as_str() != "alg")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    header.insert("enc".into(), Value::String(enc.to_string()));
    if direct {
        header.insert("alg".into(), Value::String(DIR.to_string()));
    }
    if let Some(skid) = skid {
        header.insert("skid".into(), Value::String(skid.to_string()));
    }
    header
}
