//! Anonymous key wrapping: `ECDH-ES+XC20PKW`.
//!
//! The sender generates a fresh X25519 keypair per recipient, agrees a secret
//! with the recipient's static key, and derives the KEK with the concat KDF
//! (algorithm id `"ECDH-ES+XC20PKW"`, no party info). Nothing in the entry
//! identifies the sender.

use tracing::trace;

use super::{open_cek, seal_cek, ContentKey, Decrypter, Encrypter, WrappedKey, ECDH_ES_XC20PKW};
use crate::crypto::aead::{KEY_SIZE, XC20P};
use crate::crypto::kdf::concat_kdf;
use crate::crypto::KeyPair;
use crate::envelope::{EphemeralKey, Recipient};
use crate::error::{JweError, Result};

/// Wraps the CEK for one recipient's static X25519 public key.
#[derive(Debug, Clone)]
pub struct AnonEncrypter {
    recipient_public: [u8; 32],
    kid: Option<String>,
}

impl AnonEncrypter {
    pub fn new(recipient_public: [u8; 32]) -> Self {
        Self {
            recipient_public,
            kid: None,
        }
    }

    /// Annotate the recipient header with the recipient's key identifier.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

impl Encrypter for AnonEncrypter {
    fn alg(&self) -> &str {
        ECDH_ES_XC20PKW
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn wrap_cek(&self, cek: &[u8; KEY_SIZE]) -> Result<Recipient> {
        let ephemeral = KeyPair::generate();
        let shared = ephemeral
            .diffie_hellman(&self.recipient_public)
            .ok_or(JweError::InvalidPublicKey)?;
        let kek = concat_kdf::<KEY_SIZE>(&*shared, ECDH_ES_XC20PKW, None, None);
        drop(shared);

        let (encrypted_key, mut header) = seal_cek(ECDH_ES_XC20PKW, &kek, cek)?;
        header.epk = Some(EphemeralKey::x25519(ephemeral.public_key()));
        header.kid = self.kid.clone();
        Ok(Recipient {
            encrypted_key,
            header,
        })
    }
}

/// Unwraps `ECDH-ES+XC20PKW` entries with the recipient's static keypair.
///
/// [`AnonEncrypter`] never sets party info, but other producers may. Any
/// `apu`/`apv` found in the entry header is fed to the KDF as received, so
/// such entries still open; for entries from this crate both are absent and
/// the derivation matches the wrap exactly.
#[derive(Debug, Clone)]
pub struct AnonDecrypter {
    keypair: KeyPair,
}

impl AnonDecrypter {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }
}

impl Decrypter for AnonDecrypter {
    fn alg(&self) -> &str {
        ECDH_ES_XC20PKW
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn unwrap_cek(&self, recipient: &Recipient) -> Result<ContentKey> {
        let wrapped = WrappedKey::parse(recipient)?;
        if recipient.header.alg != ECDH_ES_XC20PKW {
            return Err(JweError::DecryptionFailed);
        }
        let Some(epk) = wrapped.epk else {
            trace!("ephemeral key is not on X25519");
            return Err(JweError::DecryptionFailed);
        };

        let shared = self
            .keypair
            .diffie_hellman(&epk)
            .ok_or(JweError::DecryptionFailed)?;
        let kek = concat_kdf::<KEY_SIZE>(
            &*shared,
            ECDH_ES_XC20PKW,
            wrapped.apu.as_deref(),
            wrapped.apv.as_deref(),
        );
        drop(shared);

        open_cek(&kek, &wrapped)
    }
}
