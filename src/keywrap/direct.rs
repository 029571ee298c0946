//! Direct encryption: `alg: "dir"`.
//!
//! A pre-shared 32-byte symmetric key is used as the CEK itself. There is no
//! key wrap and no recipient entry, so a direct envelope has exactly one
//! audience: whoever holds the key.

use zeroize::Zeroizing;

use super::{ContentKey, Decrypter, Encrypter, DIR};
use crate::crypto::aead::{KEY_SIZE, XC20P};
use crate::envelope::Recipient;
use crate::error::{JweError, Result};

/// Encrypts with a shared key used directly as the CEK.
#[derive(Clone)]
pub struct DirectEncrypter {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DirectEncrypter {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }
}

impl Encrypter for DirectEncrypter {
    fn alg(&self) -> &str {
        DIR
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn direct_key(&self) -> Option<&[u8; KEY_SIZE]> {
        Some(&*self.key)
    }

    /// There is nothing to wrap: the builder never asks a direct encrypter
    /// for a recipient entry, and doing so is a usage error.
    fn wrap_cek(&self, _cek: &[u8; KEY_SIZE]) -> Result<Recipient> {
        Err(JweError::DirectRequiresSingleRecipient)
    }
}

impl std::fmt::Debug for DirectEncrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectEncrypter").finish_non_exhaustive()
    }
}

/// Decrypts direct envelopes with the shared key.
#[derive(Clone)]
pub struct DirectDecrypter {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DirectDecrypter {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }
}

impl Decrypter for DirectDecrypter {
    fn alg(&self) -> &str {
        DIR
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn direct_key(&self) -> Option<&[u8; KEY_SIZE]> {
        Some(&*self.key)
    }

    fn unwrap_cek(&self, _recipient: &Recipient) -> Result<ContentKey> {
        Err(JweError::DecryptionFailed)
    }
}

impl std::fmt::Debug for DirectDecrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectDecrypter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RecipientHeader;

    #[test]
    fn test_direct_encrypter_exposes_key() {
        let encrypter = DirectEncrypter::new([3u8; 32]);
        assert_eq!(encrypter.alg(), "dir");
        assert_eq!(encrypter.enc(), "XC20P");
        assert_eq!(encrypter.direct_key(), Some(&[3u8; 32]));
    }

    #[test]
    fn test_direct_encrypter_refuses_to_wrap() {
        let err = DirectEncrypter::new([3u8; 32]).wrap_cek(&[1u8; 32]).unwrap_err();
        assert!(matches!(err, JweError::DirectRequiresSingleRecipient), "got: {:?}", err);
    }

    #[test]
    fn test_direct_decrypter_never_unwraps_entries() {
        let decrypter = DirectDecrypter::new([3u8; 32]);
        let entry = Recipient {
            encrypted_key: String::new(),
            header: RecipientHeader {
                alg: "dir".into(),
                ..Default::default()
            },
        };
        assert!(matches!(
            decrypter.unwrap_cek(&entry),
            Err(JweError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let shown = format!("{:?}", DirectDecrypter::new([0xab; 32]));
        assert!(!shown.contains("171"), "debug output must not print key bytes");
    }
}
