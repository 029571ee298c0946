//! Crypto module: X25519 key material, Diffie-Hellman, and secure randomness.
//!
//! Key boundaries are raw `[u8; 32]` arrays. The x25519-dalek types stay inside
//! this module so that callers never juggle curve library types directly.

pub mod aead;
pub mod kdf;
pub mod passphrase;

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{JweError, Result};

/// Size of an X25519 public or secret key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a single X25519 shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// An X25519 keypair.
///
/// The secret half is zeroed when the pair is dropped. Ephemeral pairs are
/// built with [`KeyPair::generate`] inside a single wrap call and never leave it.
#[derive(Clone)]
pub struct KeyPair {
    public: [u8; KEY_SIZE],
    secret: StaticSecret,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        Self::from_static(StaticSecret::random_from_rng(OsRng))
    }

    /// Rebuild a keypair from its 32 secret bytes.
    pub fn from_secret_bytes(secret: [u8; KEY_SIZE]) -> Self {
        Self::from_static(StaticSecret::from(secret))
    }

    /// Rebuild a keypair from a secret of unchecked length.
    pub fn from_secret_slice(secret: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = secret.try_into().map_err(|_| JweError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: secret.len(),
        })?;
        Ok(Self::from_secret_bytes(bytes))
    }

    fn from_static(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret).to_bytes();
        Self { public, secret }
    }

    /// The public half as raw bytes.
    pub fn public_key(&self) -> &[u8; KEY_SIZE] {
        &self.public
    }

    /// Copy of the secret scalar, zeroed when the returned value is dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; KEY_SIZE]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// X25519 with `their_public`.
    ///
    /// Returns `None` when the peer key is a low-order point, i.e. the exchange
    /// is not contributory and the output would be predictable.
    pub fn diffie_hellman(
        &self,
        their_public: &[u8; KEY_SIZE],
    ) -> Option<Zeroizing<[u8; SHARED_SECRET_SIZE]>> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*their_public));
        if !shared.was_contributory() {
            return None;
        }
        Some(Zeroizing::new(shared.to_bytes()))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &crate::util::b64url_encode(self.public))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parse a public key of unchecked length.
pub fn public_key_from_slice(bytes: &[u8]) -> Result<[u8; KEY_SIZE]> {
    bytes.try_into().map_err(|_| JweError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: bytes.len(),
    })
}

/// Fill an `N`-byte array from the thread-local CSPRNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::thread_rng().fill_bytes(&mut out);
    out
}
