//! Local key material for the `jwecrypt` binary: the secret key file and the
//! keyring of known recipients.

pub mod fingerprint;
pub mod store;
