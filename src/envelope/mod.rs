//! Envelope module: the JWE JSON wire shape and its structural validation.
//!
//! Two serializations are produced and accepted:
//!
//! - **General**: a `recipients` array of `{encrypted_key, header}` entries.
//! - **Flattened**: a single recipient's `encrypted_key` and `header` hoisted
//!   to the top level. Direct (`alg: "dir"`) envelopes carry neither.
//!
//! All binary members are unpadded base64url. The content is authenticated
//! with associated data `ASCII(protected)`, or `ASCII(protected || '.' || aad)`
//! when an `aad` member is present.

pub mod builder;
pub mod opener;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crypto::aead::{NONCE_SIZE, TAG_SIZE};
use crate::error::{JweError, Result};
use crate::keywrap::DIR;
use crate::util::{b64url_decode, b64url_decode_array, b64url_encode};

pub use builder::{encrypt, encrypt_with_cek};
pub use opener::{decrypt, decrypt_with_options, DecryptOptions};

/// Caller-supplied protected header members, passed through verbatim.
pub type ProtectedHeader = Map<String, Value>;

/// Key type of an X25519 ephemeral key descriptor.
pub const KTY_OKP: &str = "OKP";

/// Curve name for X25519 keys.
pub const CRV_X25519: &str = "X25519";

/// A complete JWE in JSON serialization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Jwe {
    /// base64url(UTF-8(JSON protected header)).
    pub protected: String,
    /// base64url of the caller's additional authenticated data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
    /// Flattened form only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
    /// Flattened form only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<RecipientHeader>,
    /// General form only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<Recipient>>,
}

/// One recipient's wrapped copy of the content encryption key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recipient {
    pub encrypted_key: String,
    pub header: RecipientHeader,
}

/// Per-recipient unprotected header.
///
/// `iv`, `tag` and `epk` are optional at the type level so that a missing
/// member surfaces as a structural error from the key unwrap path instead of
/// an opaque parse failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RecipientHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epk: Option<EphemeralKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apv: Option<String>,
}

/// Public ephemeral key descriptor (`epk`), an OKP JWK.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EphemeralKey {
    pub kty: String,
    pub crv: String,
    pub x: String,
}

impl EphemeralKey {
    /// Descriptor for an X25519 public key.
    pub fn x25519(public_key: &[u8; 32]) -> Self {
        Self {
            kty: KTY_OKP.to_string(),
            crv: CRV_X25519.to_string(),
            x: b64url_encode(public_key),
        }
    }

    /// Whether this descriptor names an X25519 OKP key.
    pub fn is_x25519(&self) -> bool {
        self.kty == KTY_OKP && self.crv == CRV_X25519
    }
}

/// A JWE whose structure has been checked and whose binary members are decoded.
pub(crate) struct ParsedJwe<'a> {
    pub header: ProtectedHeader,
    pub iv: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
    pub content_aad: Vec<u8>,
    /// Recipient entries in insertion order; empty for direct envelopes.
    pub recipients: Vec<Cow<'a, Recipient>>,
}

impl ParsedJwe<'_> {
    pub fn enc(&self) -> Option<&str> {
        self.header.get("enc").and_then(Value::as_str)
    }

    pub fn is_direct(&self) -> bool {
        self.header.get("alg").and_then(Value::as_str) == Some(DIR)
    }
}

impl Jwe {
    /// Parse a JWE from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| JweError::InvalidEnvelope(e.to_string()))
    }

    /// Compact JSON serialization.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| JweError::InvalidEnvelope(e.to_string()))
    }

    /// Indented JSON serialization.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| JweError::InvalidEnvelope(e.to_string()))
    }

    /// Decode the protected header into its member map.
    pub fn protected_header(&self) -> Result<ProtectedHeader> {
        if self.protected.is_empty() {
            return Err(JweError::InvalidEnvelope("missing protected header".into()));
        }
        let bytes = b64url_decode(&self.protected, "protected")?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(JweError::InvalidEnvelope(
                "protected header is not a JSON object".into(),
            )),
            Err(e) => Err(JweError::InvalidEnvelope(format!(
                "protected header is not valid JSON: {}",
                e
            ))),
        }
    }

    /// Recipient entries in insertion order, for either serialization.
    ///
    /// A flattened envelope yields its single entry; a direct envelope yields none.
    pub fn recipient_entries(&self) -> Vec<Cow<'_, Recipient>> {
        if let Some(recipients) = &self.recipients {
            return recipients.iter().map(Cow::Borrowed).collect();
        }
        match (&self.encrypted_key, &self.header) {
            (Some(encrypted_key), Some(header)) => vec![Cow::Owned(Recipient {
                encrypted_key: encrypted_key.clone(),
                header: header.clone(),
            })],
            _ => Vec::new(),
        }
    }

    /// Structural validation. No key material is touched here.
    pub(crate) fn parse(&self) -> Result<ParsedJwe<'_>> {
        let header = self.protected_header()?;
        if !matches!(header.get("enc"), Some(Value::String(_))) {
            return Err(JweError::InvalidEnvelope(
                "protected header is missing enc".into(),
            ));
        }
        if self.iv.is_empty() || self.tag.is_empty() {
            return Err(JweError::InvalidEnvelope("missing iv or tag".into()));
        }

        let iv = b64url_decode_array::<NONCE_SIZE>(&self.iv, "iv")?;
        let tag = b64url_decode_array::<TAG_SIZE>(&self.tag, "tag")?;
        let ciphertext = b64url_decode(&self.ciphertext, "ciphertext")?;
        if let Some(aad) = &self.aad {
            b64url_decode(aad, "aad")?;
        }

        let flattened = self.encrypted_key.is_some() || self.header.is_some();
        if flattened && (self.encrypted_key.is_none() || self.header.is_none()) {
            return Err(JweError::InvalidEnvelope(
                "flattened recipient needs both encrypted_key and header".into(),
            ));
        }
        if flattened && self.recipients.is_some() {
            return Err(JweError::InvalidEnvelope(
                "envelope mixes flattened and general recipients".into(),
            ));
        }
        if matches!(&self.recipients, Some(r) if r.is_empty()) {
            return Err(JweError::InvalidEnvelope("recipients is empty".into()));
        }

        let recipients = self.recipient_entries();
        let direct = header.get("alg").and_then(Value::as_str) == Some(DIR);
        if direct && !recipients.is_empty() {
            return Err(JweError::InvalidEnvelope(
                "direct envelope must not carry recipients".into(),
            ));
        }
        if !direct && recipients.is_empty() {
            return Err(JweError::InvalidEnvelope("missing recipients".into()));
        }
        for recipient in &recipients {
            if recipient.header.alg.is_empty() {
                return Err(JweError::InvalidEnvelope(
                    "recipient header is missing alg".into(),
                ));
            }
        }

        Ok(ParsedJwe {
            header,
            iv,
            tag,
            ciphertext,
            content_aad: content_aad(&self.protected, self.aad.as_deref()),
            recipients,
        })
    }
}

/// Associated data for the content seal.
pub(crate) fn content_aad(protected: &str, aad: Option<&str>) -> Vec<u8> {
    match aad {
        Some(aad) => format!("{}.{}", protected, aad).into_bytes(),
        None => protected.as_bytes().to_vec(),
    }
}
