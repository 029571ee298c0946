//! Passphrase-protected secret key file format.
//!
//! The local X25519 secret is sealed under a key derived from a passphrase
//! with Argon2id + HKDF-SHA256 and stored in a self-describing binary envelope:
//!
//! ```text
//! Offset  Size  Field
//! 0       8     Magic: b"JWECKEY1"
//! 8       1     Version: 0x01
//! 9       4     m_cost (Argon2, u32 big-endian)
//! 13      4     t_cost (Argon2, u32 big-endian)
//! 17      4     p_cost (Argon2, u32 big-endian)
//! 21      32    Salt
//! 53      24    XChaCha20 nonce
//! 77      16    Poly1305 tag
//! 93      32    Sealed secret key
//! ```

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::aead::{self, NONCE_SIZE, TAG_SIZE};
use super::{random_bytes, KEY_SIZE};

/// Magic header bytes identifying the key file envelope.
pub const KEY_FILE_MAGIC: &[u8; 8] = b"JWECKEY1";

/// Current version byte.
const KEY_FILE_VERSION: u8 = 0x01;

/// 8 magic + 1 version + 3 * 4 Argon2 params + 32 salt.
const HEADER_LEN: usize = 53;

/// Header, nonce, tag, sealed key.
const KEY_FILE_LEN: usize = HEADER_LEN + NONCE_SIZE + TAG_SIZE + KEY_SIZE;

/// HKDF info string for the key file KEK.
const KEY_HKDF_INFO: &[u8] = b"jwecrypt-key-v1";

/// Default Argon2id memory cost (64 MB).
pub const KDF_M_COST: u32 = 65536;

/// Default Argon2id iteration count.
pub const KDF_T_COST: u32 = 3;

/// Default Argon2id parallelism.
pub const KDF_P_COST: u32 = 1;

/// Argon2id cost parameters, stored in the envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: KDF_M_COST,
            t_cost: KDF_T_COST,
            p_cost: KDF_P_COST,
        }
    }
}

/// Derive the 32-byte key file KEK from a passphrase and salt.
fn derive_file_key(
    passphrase: &str,
    salt: &[u8; 32],
    params: KdfParams,
) -> anyhow::Result<Zeroizing<[u8; 32]>> {
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| anyhow::anyhow!("argon2 params error: {}", e))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut stretched = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, stretched.as_mut())
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {}", e))?;

    let hkdf = Hkdf::<Sha256>::new(None, &*stretched);
    let mut okm = Zeroizing::new([0u8; 32]);
    hkdf.expand(KEY_HKDF_INFO, okm.as_mut())
        .map_err(|e| anyhow::anyhow!("hkdf expand error: {}", e))?;

    Ok(okm)
}

/// Seal a 32-byte secret key into a passphrase-protected envelope.
pub fn seal_secret_key(
    secret: &[u8; KEY_SIZE],
    passphrase: &str,
    params: KdfParams,
) -> anyhow::Result<Vec<u8>> {
    let salt: [u8; 32] = random_bytes();
    let file_key = derive_file_key(passphrase, &salt, params)?;

    let mut envelope = Vec::with_capacity(KEY_FILE_LEN);
    envelope.extend_from_slice(KEY_FILE_MAGIC);
    envelope.push(KEY_FILE_VERSION);
    envelope.extend_from_slice(&params.m_cost.to_be_bytes());
    envelope.extend_from_slice(&params.t_cost.to_be_bytes());
    envelope.extend_from_slice(&params.p_cost.to_be_bytes());
    envelope.extend_from_slice(&salt);

    // The header is bound as associated data so cost parameters cannot be swapped
    let sealed = aead::seal(&file_key, secret, &envelope)?;
    envelope.extend_from_slice(&sealed.iv);
    envelope.extend_from_slice(&sealed.tag);
    envelope.extend_from_slice(&sealed.ciphertext);

    Ok(envelope)
}

/// Open a passphrase-protected envelope back into the 32-byte secret key.
///
/// Argon2 parameters are read from the header, not from the defaults, so
/// files written with other costs still open.
pub fn open_secret_key(envelope: &[u8], passphrase: &str) -> anyhow::Result<Zeroizing<[u8; 32]>> {
    if envelope.len() != KEY_FILE_LEN {
        anyhow::bail!(
            "Invalid key file: expected {} bytes, got {}",
            KEY_FILE_LEN,
            envelope.len()
        );
    }
    if &envelope[..8] != KEY_FILE_MAGIC {
        anyhow::bail!("Invalid key file: wrong magic bytes");
    }
    if envelope[8] != KEY_FILE_VERSION {
        anyhow::bail!("Unsupported key file version: {}", envelope[8]);
    }

    let params = KdfParams {
        m_cost: read_u32(&envelope[9..13])?,
        t_cost: read_u32(&envelope[13..17])?,
        p_cost: read_u32(&envelope[17..21])?,
    };
    let salt: [u8; 32] = envelope[21..HEADER_LEN].try_into()?;
    let nonce: [u8; NONCE_SIZE] = envelope[HEADER_LEN..HEADER_LEN + NONCE_SIZE].try_into()?;
    let tag_start = HEADER_LEN + NONCE_SIZE;
    let tag: [u8; TAG_SIZE] = envelope[tag_start..tag_start + TAG_SIZE].try_into()?;
    let ciphertext = &envelope[tag_start + TAG_SIZE..];

    let file_key = derive_file_key(passphrase, &salt, params)?;
    let plaintext = Zeroizing::new(
        aead::open(&file_key, &nonce, ciphertext, &tag, &envelope[..HEADER_LEN])
            .map_err(|_| anyhow::anyhow!("Wrong passphrase or corrupted key file"))?,
    );

    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&plaintext);
    Ok(secret)
}

/// Whether `bytes` look like a passphrase-protected key file.
pub fn is_sealed_key_file(bytes: &[u8]) -> bool {
    bytes.starts_with(KEY_FILE_MAGIC)
}

fn read_u32(bytes: &[u8]) -> anyhow::Result<u32> {
    Ok(u32::from_be_bytes(bytes.try_into()?))
}
