//! Sender-authenticated key wrapping: `ECDH-1PU+XC20PKW`.
//!
//! ```text
//! zE  = X25519(ephemeral_secret, recipient_public)
//! zS  = X25519(sender_secret,    recipient_public)
//! Z   = zE || zS
//! KEK = ConcatKDF(Z, 256, "ECDH-1PU+XC20PKW", PartyUInfo, PartyVInfo)
//! ```
//!
//! Party info runs in a fixed direction: the sender's identifier feeds
//! PartyUInfo (`apu`) and the recipient's feeds PartyVInfo (`apv`). Explicit
//! `apu`/`apv` options win over the `skid`/`kid` fallbacks. Whatever raw bytes
//! the KDF consumed are written base64url-encoded into the recipient header, and
//! the receiving side derives only from those header values.

use tracing::trace;
use zeroize::Zeroizing;

use super::{open_cek, seal_cek, ContentKey, Decrypter, Encrypter, WrappedKey, ECDH_1PU_XC20PKW};
use crate::crypto::aead::{KEY_SIZE, XC20P};
use crate::crypto::kdf::concat_kdf;
use crate::crypto::{KeyPair, SHARED_SECRET_SIZE};
use crate::envelope::{EphemeralKey, Recipient};
use crate::error::{JweError, Result};
use crate::util::b64url_encode;

/// Optional identifiers for an authenticated wrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    /// Recipient key identifier, written to the recipient header.
    pub kid: Option<String>,
    /// Sender key identifier, written to the protected header.
    pub skid: Option<String>,
    /// Explicit PartyUInfo, as text.
    pub apu: Option<String>,
    /// Explicit PartyVInfo, as text.
    pub apv: Option<String>,
}

impl AuthOptions {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("kid", &self.kid),
            ("skid", &self.skid),
            ("apu", &self.apu),
            ("apv", &self.apv),
        ];
        for (name, value) in fields {
            if value.as_deref() == Some("") {
                return Err(JweError::InvalidOptions(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// PartyUInfo: explicit `apu`, else the sender's `skid`.
    fn party_u_info(&self) -> Option<Vec<u8>> {
        self.apu
            .as_ref()
            .or(self.skid.as_ref())
            .map(|s| s.as_bytes().to_vec())
    }

    /// PartyVInfo: explicit `apv`, else the recipient's `kid`.
    fn party_v_info(&self) -> Option<Vec<u8>> {
        self.apv
            .as_ref()
            .or(self.kid.as_ref())
            .map(|s| s.as_bytes().to_vec())
    }
}

/// Wraps the CEK for one recipient, authenticated by the sender's static key.
#[derive(Debug, Clone)]
pub struct AuthEncrypter {
    recipient_public: [u8; 32],
    sender: KeyPair,
    options: AuthOptions,
    party_u_info: Option<Vec<u8>>,
    party_v_info: Option<Vec<u8>>,
}

impl AuthEncrypter {
    /// Options are checked here, once, rather than on every wrap.
    pub fn new(recipient_public: [u8; 32], sender: KeyPair, options: AuthOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            recipient_public,
            sender,
            party_u_info: options.party_u_info(),
            party_v_info: options.party_v_info(),
            options,
        })
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }
}

impl Encrypter for AuthEncrypter {
    fn alg(&self) -> &str {
        ECDH_1PU_XC20PKW
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn skid(&self) -> Option<&str> {
        self.options.skid.as_deref()
    }

    fn wrap_cek(&self, cek: &[u8; KEY_SIZE]) -> Result<Recipient> {
        let ephemeral = KeyPair::generate();
        let z_e = ephemeral
            .diffie_hellman(&self.recipient_public)
            .ok_or(JweError::InvalidPublicKey)?;
        let z_s = self
            .sender
            .diffie_hellman(&self.recipient_public)
            .ok_or(JweError::InvalidPublicKey)?;
        let shared = concat_secrets(&z_e, &z_s);
        drop((z_e, z_s));

        let kek = concat_kdf::<KEY_SIZE>(
            &*shared,
            ECDH_1PU_XC20PKW,
            self.party_u_info.as_deref(),
            self.party_v_info.as_deref(),
        );
        drop(shared);

        let (encrypted_key, mut header) = seal_cek(ECDH_1PU_XC20PKW, &kek, cek)?;
        header.epk = Some(EphemeralKey::x25519(ephemeral.public_key()));
        header.kid = self.options.kid.clone();
        header.apu = self.party_u_info.as_ref().map(|info| b64url_encode(info));
        header.apv = self.party_v_info.as_ref().map(|info| b64url_encode(info));
        Ok(Recipient {
            encrypted_key,
            header,
        })
    }
}

/// Unwraps `ECDH-1PU+XC20PKW` entries from one claimed sender.
///
/// Entries wrapped by any other sender key fail exactly like tampered ones.
#[derive(Debug, Clone)]
pub struct AuthDecrypter {
    keypair: KeyPair,
    sender_public: [u8; 32],
}

impl AuthDecrypter {
    pub fn new(keypair: KeyPair, sender_public: [u8; 32]) -> Self {
        Self {
            keypair,
            sender_public,
        }
    }
}

impl Decrypter for AuthDecrypter {
    fn alg(&self) -> &str {
        ECDH_1PU_XC20PKW
    }

    fn enc(&self) -> &str {
        XC20P
    }

    fn unwrap_cek(&self, recipient: &Recipient) -> Result<ContentKey> {
        let wrapped = WrappedKey::parse(recipient)?;
        if recipient.header.alg != ECDH_1PU_XC20PKW {
            return Err(JweError::DecryptionFailed);
        }
        let Some(epk) = wrapped.epk else {
            trace!("ephemeral key is not on X25519");
            return Err(JweError::DecryptionFailed);
        };

        let z_e = self
            .keypair
            .diffie_hellman(&epk)
            .ok_or(JweError::DecryptionFailed)?;
        let z_s = self
            .keypair
            .diffie_hellman(&self.sender_public)
            .ok_or(JweError::DecryptionFailed)?;
        let shared = concat_secrets(&z_e, &z_s);
        drop((z_e, z_s));

        let kek = concat_kdf::<KEY_SIZE>(
            &*shared,
            ECDH_1PU_XC20PKW,
            wrapped.apu.as_deref(),
            wrapped.apv.as_deref(),
        );
        drop(shared);

        open_cek(&kek, &wrapped)
    }
}

/// `zE || zS`, ephemeral-derived half first.
fn concat_secrets(
    z_e: &[u8; SHARED_SECRET_SIZE],
    z_s: &[u8; SHARED_SECRET_SIZE],
) -> Zeroizing<[u8; 2 * SHARED_SECRET_SIZE]> {
    let mut shared = Zeroizing::new([0u8; 2 * SHARED_SECRET_SIZE]);
    shared[..SHARED_SECRET_SIZE].copy_from_slice(z_e);
    shared[SHARED_SECRET_SIZE..].copy_from_slice(z_s);
    shared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> KeyPair {
        KeyPair::from_secret_bytes([42u8; 32])
    }

    fn recipient() -> KeyPair {
        KeyPair::from_secret_bytes([99u8; 32])
    }

    fn options(kid: Option<&str>, skid: Option<&str>, apu: Option<&str>, apv: Option<&str>) -> AuthOptions {
        AuthOptions {
            kid: kid.map(str::to_string),
            skid: skid.map(str::to_string),
            apu: apu.map(str::to_string),
            apv: apv.map(str::to_string),
        }
    }

    fn wrap(opts: AuthOptions) -> Recipient {
        AuthEncrypter::new(*recipient().public_key(), sender(), opts)
            .expect("options are valid")
            .wrap_cek(&[5u8; 32])
            .expect("wrap should succeed")
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let entry = wrap(options(Some("bob#1"), Some("alice#1"), None, None));
        assert_eq!(entry.header.alg, "ECDH-1PU+XC20PKW");
        assert_eq!(entry.header.kid.as_deref(), Some("bob#1"));

        let decrypter = AuthDecrypter::new(recipient(), *sender().public_key());
        let cek = decrypter.unwrap_cek(&entry).expect("unwrap should succeed");
        assert_eq!(*cek, [5u8; 32]);
    }

    #[test]
    fn test_party_info_derived_from_skid_and_kid() {
        let entry = wrap(options(Some("did:example:bob#key-1"), Some("did:example:alice#key-1"), None, None));
        assert_eq!(
            entry.header.apu.as_deref(),
            Some(b64url_encode("did:example:alice#key-1").as_str()),
            "apu must carry the encoded skid"
        );
        assert_eq!(
            entry.header.apv.as_deref(),
            Some(b64url_encode("did:example:bob#key-1").as_str()),
            "apv must carry the encoded kid"
        );
    }

    #[test]
    fn test_explicit_party_info_takes_precedence() {
        let entry = wrap(options(Some("bob#1"), Some("alice#1"), Some("Alice"), Some("Bob")));
        assert_eq!(entry.header.apu.as_deref(), Some(b64url_encode("Alice").as_str()));
        assert_eq!(entry.header.apv.as_deref(), Some(b64url_encode("Bob").as_str()));

        let decrypter = AuthDecrypter::new(recipient(), *sender().public_key());
        assert!(decrypter.unwrap_cek(&entry).is_ok());
    }

    #[test]
    fn test_no_identifiers_means_no_party_info() {
        let entry = wrap(AuthOptions::default());
        assert!(entry.header.apu.is_none());
        assert!(entry.header.apv.is_none());
        assert!(entry.header.kid.is_none());
    }

    #[test]
    fn test_wrong_sender_fails_uniformly() {
        let entry = wrap(options(None, Some("alice#1"), None, None));
        let impostor = KeyPair::from_secret_bytes([7u8; 32]);
        let decrypter = AuthDecrypter::new(recipient(), *impostor.public_key());
        assert!(matches!(
            decrypter.unwrap_cek(&entry),
            Err(JweError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_party_info_fails() {
        let mut entry = wrap(options(Some("bob#1"), Some("alice#1"), None, None));
        entry.header.apu = Some(b64url_encode("mallory#1"));
        let decrypter = AuthDecrypter::new(recipient(), *sender().public_key());
        assert!(matches!(
            decrypter.unwrap_cek(&entry),
            Err(JweError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_anonymous_entry_rejected() {
        let keypair = recipient();
        let entry = crate::keywrap::AnonEncrypter::new(*keypair.public_key())
            .wrap_cek(&[5u8; 32])
            .expect("wrap");
        let decrypter = AuthDecrypter::new(keypair, *sender().public_key());
        assert!(matches!(
            decrypter.unwrap_cek(&entry),
            Err(JweError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_empty_option_rejected_at_construction() {
        let err = AuthEncrypter::new(*recipient().public_key(), sender(), options(Some(""), None, None, None))
            .unwrap_err();
        assert!(matches!(err, JweError::InvalidOptions(_)), "got: {:?}", err);
    }

    #[test]
    fn test_shared_secret_order_matters() {
        let z_e = [1u8; 32];
        let z_s = [2u8; 32];
        let shared = concat_secrets(&z_e, &z_s);
        assert_eq!(&shared[..32], &z_e);
        assert_eq!(&shared[32..], &z_s);
    }
}
