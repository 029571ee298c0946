//! Key management: how the content encryption key (CEK) reaches each recipient.
//!
//! An [`Encrypter`] turns the shared CEK into one [`Recipient`] entry; a
//! [`Decrypter`] turns a matching entry back into the CEK. Three modes exist:
//!
//! - `ECDH-ES+XC20PKW` ([`anon`]): anonymous ephemeral-static X25519.
//! - `ECDH-1PU+XC20PKW` ([`auth`]): ephemeral-static plus sender static-static
//!   X25519, binding the wrap to the sender's identity.
//! - `dir` ([`direct`]): a pre-shared key used as the CEK, no wrapping.
//!
//! The KEK from the concat KDF seals the 32-byte CEK with XChaCha20-Poly1305 and
//! empty associated data; its nonce and tag ride in the recipient header.

pub mod anon;
pub mod auth;
pub mod direct;

use zeroize::Zeroizing;

use crate::crypto::aead::{self, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::crypto::KEY_SIZE as PUBLIC_KEY_SIZE;
use crate::envelope::{Recipient, RecipientHeader};
use crate::error::{JweError, Result};
use crate::util::{b64url_decode, b64url_decode_array, b64url_encode};

pub use anon::{AnonDecrypter, AnonEncrypter};
pub use auth::{AuthDecrypter, AuthEncrypter, AuthOptions};
pub use direct::{DirectDecrypter, DirectEncrypter};

/// Direct use of a shared symmetric key as the CEK.
pub const DIR: &str = "dir";

/// Anonymous ECDH-ES with XChaCha20-Poly1305 key wrapping.
pub const ECDH_ES_XC20PKW: &str = "ECDH-ES+XC20PKW";

/// Authenticated ECDH-1PU with XChaCha20-Poly1305 key wrapping.
pub const ECDH_1PU_XC20PKW: &str = "ECDH-1PU+XC20PKW";

/// A content encryption key, zeroed on drop.
pub type ContentKey = Zeroizing<[u8; KEY_SIZE]>;

/// Produces one recipient entry per envelope from the shared CEK.
pub trait Encrypter: Send + Sync {
    /// Key management algorithm written into the recipient header.
    fn alg(&self) -> &str;

    /// Content encryption algorithm this encrypter is meant to travel with.
    fn enc(&self) -> &str;

    /// Sender key identifier to place in the protected header, if any.
    fn skid(&self) -> Option<&str> {
        None
    }

    /// For direct encryption: the key to use as the CEK itself.
    fn direct_key(&self) -> Option<&[u8; KEY_SIZE]> {
        None
    }

    /// Wrap `cek` for this encrypter's recipient.
    fn wrap_cek(&self, cek: &[u8; KEY_SIZE]) -> Result<Recipient>;
}

/// Recovers the CEK from a recipient entry addressed to its holder.
pub trait Decrypter: Send + Sync {
    /// Key management algorithm this decrypter handles.
    fn alg(&self) -> &str;

    /// Content encryption algorithm this decrypter expects.
    fn enc(&self) -> &str;

    /// For direct decryption: the shared key used as the CEK.
    fn direct_key(&self) -> Option<&[u8; KEY_SIZE]> {
        None
    }

    /// Unwrap the CEK.
    ///
    /// A malformed entry is [`JweError::InvalidEnvelope`]. Every cryptographic
    /// failure, an entry meant for someone else included, is
    /// [`JweError::DecryptionFailed`].
    fn unwrap_cek(&self, recipient: &Recipient) -> Result<ContentKey>;
}

/// Decoded key-wrap members of a recipient entry.
#[derive(Debug)]
pub(crate) struct WrappedKey {
    pub encrypted_key: Vec<u8>,
    pub iv: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    /// `None` when `epk` names a curve other than X25519.
    pub epk: Option<[u8; PUBLIC_KEY_SIZE]>,
    pub apu: Option<Vec<u8>>,
    pub apv: Option<Vec<u8>>,
}

impl WrappedKey {
    /// Structural checks shared by both ECDH unwrap paths.
    ///
    /// Missing `epk`, `iv` or `tag` is an envelope error. A foreign curve is
    /// not: it is recorded as `epk: None` and fails later as an ordinary
    /// decryption failure.
    pub fn parse(recipient: &Recipient) -> Result<Self> {
        let header = &recipient.header;
        let missing = |field: &str| {
            JweError::InvalidEnvelope(format!("recipient header is missing {}", field))
        };
        let epk = header.epk.as_ref().ok_or_else(|| missing("epk"))?;
        let iv = header.iv.as_deref().ok_or_else(|| missing("iv"))?;
        let tag = header.tag.as_deref().ok_or_else(|| missing("tag"))?;

        let epk = if epk.is_x25519() {
            Some(b64url_decode_array::<PUBLIC_KEY_SIZE>(&epk.x, "epk.x")?)
        } else {
            None
        };

        Ok(Self {
            encrypted_key: b64url_decode(&recipient.encrypted_key, "encrypted_key")?,
            iv: b64url_decode_array(iv, "recipient iv")?,
            tag: b64url_decode_array(tag, "recipient tag")?,
            epk,
            apu: decode_party_info(header.apu.as_deref(), "apu")?,
            apv: decode_party_info(header.apv.as_deref(), "apv")?,
        })
    }
}

fn decode_party_info(value: Option<&str>, field: &str) -> Result<Option<Vec<u8>>> {
    value.map(|v| b64url_decode(v, field)).transpose()
}

/// Seal the CEK under a KEK and start a recipient header with the result.
pub(crate) fn seal_cek(
    alg: &str,
    kek: &[u8; KEY_SIZE],
    cek: &[u8; KEY_SIZE],
) -> Result<(String, RecipientHeader)> {
    let sealed = aead::seal(kek, cek, &[])?;
    let header = RecipientHeader {
        alg: alg.to_string(),
        iv: Some(b64url_encode(sealed.iv)),
        tag: Some(b64url_encode(sealed.tag)),
        ..Default::default()
    };
    Ok((b64url_encode(&sealed.ciphertext), header))
}

/// Open a wrapped CEK under a KEK.
pub(crate) fn open_cek(kek: &[u8; KEY_SIZE], wrapped: &WrappedKey) -> Result<ContentKey> {
    let plaintext = Zeroizing::new(aead::open(
        kek,
        &wrapped.iv,
        &wrapped.encrypted_key,
        &wrapped.tag,
        &[],
    )?);
    if plaintext.len() != KEY_SIZE {
        return Err(JweError::DecryptionFailed);
    }
    let mut cek = Zeroizing::new([0u8; KEY_SIZE]);
    cek.copy_from_slice(&plaintext);
    Ok(cek)
}
