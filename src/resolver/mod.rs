//! Resolver module: turning recipient identifiers into key agreement keys.
//!
//! A [`Resolver`] answers one identifier at a time. The aggregation helpers
//! look each identifier up explicitly, keep only X25519 keys, and fail the
//! whole batch if any identifier has none. Lookup problems are reported as
//! `Resolution`/`NoSuitableKeys`, never as cryptographic failures.
//!
//! [`Keyring`] is the concrete JSON-backed resolver used by the `jwecrypt`
//! binary:
//!
//! ```json
//! { "did:example:bob": [ { "id": "did:example:bob#key-1", "curve": "X25519", "public_key": "..." } ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{public_key_from_slice, KeyPair};
use crate::envelope::CRV_X25519;
use crate::error::{JweError, Result, StoreError};
use crate::keywrap::{AnonEncrypter, AuthEncrypter, AuthOptions};
use crate::util::{b64url_decode, b64url_encode};

/// A published key agreement key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AgreementKey {
    /// Key identifier, used as `kid` in recipient headers.
    pub id: String,
    /// Curve name, e.g. `"X25519"`.
    pub curve: String,
    /// base64url-encoded raw public key.
    pub public_key: String,
}

impl AgreementKey {
    /// An X25519 key entry.
    pub fn x25519(id: impl Into<String>, public_key: &[u8; 32]) -> Self {
        Self {
            id: id.into(),
            curve: CRV_X25519.to_string(),
            public_key: b64url_encode(public_key),
        }
    }

    /// The raw public key, if this is a well-formed X25519 key.
    pub fn x25519_public_key(&self) -> Option<[u8; 32]> {
        if self.curve != CRV_X25519 {
            return None;
        }
        let bytes = b64url_decode(&self.public_key, "public_key").ok()?;
        public_key_from_slice(&bytes).ok()
    }
}

/// Looks up the key agreement keys published for an identifier.
pub trait Resolver {
    /// All keys for `id`, on any curve. Failures are `JweError::Resolution`.
    fn resolve(&self, id: &str) -> Result<Vec<AgreementKey>>;
}

impl Resolver for BTreeMap<String, Vec<AgreementKey>> {
    fn resolve(&self, id: &str) -> Result<Vec<AgreementKey>> {
        self.get(id)
            .cloned()
            .ok_or_else(|| JweError::Resolution(id.to_string()))
    }
}

/// An X25519 key found for an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub kid: String,
    pub public_key: [u8; 32],
}

/// X25519 keys for one identifier. An identifier with none is `NoSuitableKeys`.
pub fn resolve_x25519_key(resolver: &dyn Resolver, id: &str) -> Result<Vec<ResolvedKey>> {
    let keys: Vec<ResolvedKey> = resolver
        .resolve(id)?
        .into_iter()
        .filter_map(|key| {
            let public_key = key.x25519_public_key()?;
            Some(ResolvedKey {
                kid: key.id,
                public_key,
            })
        })
        .collect();
    if keys.is_empty() {
        return Err(JweError::NoSuitableKeys(id.to_string()));
    }
    debug!(id, keys = keys.len(), "resolved key agreement keys");
    Ok(keys)
}

/// X25519 keys for every identifier, in identifier order.
pub fn resolve_x25519_keys(resolver: &dyn Resolver, ids: &[&str]) -> Result<Vec<ResolvedKey>> {
    let per_id = ids
        .iter()
        .map(|id| resolve_x25519_key(resolver, id))
        .collect::<Result<Vec<_>>>()?;
    Ok(per_id.into_iter().flatten().collect())
}

/// One anonymous encrypter per X25519 key of every identifier.
pub fn resolve_x25519_encrypters(
    resolver: &dyn Resolver,
    ids: &[&str],
) -> Result<Vec<AnonEncrypter>> {
    Ok(resolve_x25519_keys(resolver, ids)?
        .into_iter()
        .map(|key| AnonEncrypter::new(key.public_key).with_kid(key.kid))
        .collect())
}

/// One authenticated encrypter per X25519 key of every identifier, all
/// sending as `sender` under `skid`.
pub fn resolve_x25519_auth_encrypters(
    resolver: &dyn Resolver,
    ids: &[&str],
    sender: &KeyPair,
    skid: Option<&str>,
) -> Result<Vec<AuthEncrypter>> {
    resolve_x25519_keys(resolver, ids)?
        .into_iter()
        .map(|key| {
            let options = AuthOptions {
                kid: Some(key.kid),
                skid: skid.map(str::to_string),
                ..Default::default()
            };
            AuthEncrypter::new(key.public_key, sender.clone(), options)
        })
        .collect()
}

/// Local address book of identifiers and their keys.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Keyring {
    entries: BTreeMap<String, Vec<AgreementKey>>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Add `key` under `id`. A key id already listed for `id` is rejected.
    pub fn add(&mut self, id: &str, key: AgreementKey) -> std::result::Result<(), StoreError> {
        let keys = self.entries.entry(id.to_string()).or_default();
        if keys.iter().any(|k| k.id == key.id) {
            return Err(StoreError::KeyringEntryExists(key.id));
        }
        keys.push(key);
        Ok(())
    }

    /// Drop every key listed for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Identifiers and their keys, sorted by identifier.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[AgreementKey])> {
        self.entries.iter().map(|(id, keys)| (id.as_str(), keys.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for Keyring {
    fn resolve(&self, id: &str) -> Result<Vec<AgreementKey>> {
        self.entries.resolve(id)
    }
}
