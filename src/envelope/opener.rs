//! Envelope decryption.
//!
//! The envelope's own structure is checked in full before any key material is
//! touched. Recipient entries are unprotected, so each one is judged on its
//! own: a malformed entry among several is skipped rather than allowed to
//! block the others. Every failure a caller can observe past that point is the
//! same `DecryptionFailed`, whether the entry was meant for someone else, the
//! ciphertext was altered, or the ephemeral key sits on a foreign curve.

use tracing::{debug, trace};

use super::{Jwe, ParsedJwe, Recipient};
use crate::crypto::aead::{self, KEY_SIZE};
use crate::error::{JweError, Result};
use crate::keywrap::{Decrypter, DIR};

/// Limits applied while searching for a matching recipient entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptOptions {
    /// Maximum number of candidate entries to try. `None` tries them all.
    pub max_attempts: Option<usize>,
}

/// Decrypt `jwe` with `decrypter`, trying every compatible recipient entry.
pub fn decrypt(jwe: &Jwe, decrypter: &dyn Decrypter) -> Result<Vec<u8>> {
    decrypt_with_options(jwe, decrypter, &DecryptOptions::default())
}

/// Decrypt with explicit search limits.
///
/// Candidates are entries whose `alg` matches the decrypter, tried in the
/// order they appear in the envelope. The first one that yields a CEK which
/// also opens the content wins.
pub fn decrypt_with_options(
    jwe: &Jwe,
    decrypter: &dyn Decrypter,
    options: &DecryptOptions,
) -> Result<Vec<u8>> {
    // ── 1. Structure ──
    let parsed = jwe.parse()?;
    let enc = parsed.enc().unwrap_or_default();
    if enc != decrypter.enc() {
        return Err(JweError::UnsupportedEncryption(enc.to_string()));
    }

    // ── 2. Direct envelopes ──
    if parsed.is_direct() {
        let key = decrypter
            .direct_key()
            .filter(|_| decrypter.alg() == DIR)
            .ok_or(JweError::DecryptionFailed)?;
        debug!("opening direct envelope");
        return open_content(&parsed, key);
    }
    if decrypter.direct_key().is_some() {
        return Err(JweError::DecryptionFailed);
    }

    // ── 3. Candidate selection ──
    let candidates: Vec<(usize, &Recipient)> = parsed
        .recipients
        .iter()
        .map(|r| &**r)
        .enumerate()
        .filter(|(_, r)| r.header.alg == decrypter.alg())
        .collect();
    let sole = candidates.len() == 1;

    // ── 4. Try each candidate in insertion order ──
    let limit = options.max_attempts.unwrap_or(usize::MAX);
    let mut attempted = 0usize;
    let mut malformed = None;
    for (index, recipient) in candidates.into_iter().take(limit) {
        attempted += 1;
        debug!(index, alg = %recipient.header.alg, "trying recipient entry");
        let cek = match decrypter.unwrap_cek(recipient) {
            Ok(cek) => cek,
            Err(JweError::DecryptionFailed) => {
                trace!(index, "recipient entry did not open");
                continue;
            }
            Err(JweError::InvalidEnvelope(reason)) if !sole => {
                trace!(index, "skipping malformed recipient entry");
                malformed.get_or_insert((0usize, reason)).0 += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        match open_content(&parsed, &cek) {
            Ok(plaintext) => return Ok(plaintext),
            Err(JweError::DecryptionFailed) => {
                trace!(index, "recipient entry did not open");
            }
            Err(e) => return Err(e),
        }
    }

    // Every entry tried was unusable: that is a broken envelope, not a wrong key
    match malformed {
        Some((count, reason)) if count == attempted => Err(JweError::InvalidEnvelope(reason)),
        _ => Err(JweError::DecryptionFailed),
    }
}

fn open_content(parsed: &ParsedJwe<'_>, cek: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    aead::open(
        cek,
        &parsed.iv,
        &parsed.ciphertext,
        &parsed.tag,
        &parsed.content_aad,
    )
}
