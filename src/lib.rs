//! jwecrypt: multi-recipient JWE encryption over X25519.
//!
//! Content is sealed once with XChaCha20-Poly1305 under a random content
//! key, and that key is wrapped for each recipient with one of:
//!
//! - `ECDH-ES+XC20PKW`, anonymous ([`AnonEncrypter`] / [`AnonDecrypter`])
//! - `ECDH-1PU+XC20PKW`, sender-authenticated ([`AuthEncrypter`] / [`AuthDecrypter`])
//! - `dir`, a pre-shared key used as the content key ([`DirectEncrypter`] / [`DirectDecrypter`])
//!
//! ```no_run
//! use jwecrypt::{decrypt, encrypt, AnonDecrypter, AnonEncrypter, KeyPair};
//!
//! let bob = KeyPair::generate();
//! let to_bob = AnonEncrypter::new(*bob.public_key()).with_kid("did:example:bob#key-1");
//! let jwe = encrypt(b"hello", &[&to_bob], None, None)?;
//! let plaintext = decrypt(&jwe, &AnonDecrypter::new(bob))?;
//! assert_eq!(plaintext, b"hello");
//! # Ok::<(), jwecrypt::JweError>(())
//! ```
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod keywrap;
pub mod resolver;
pub mod util;

pub use crypto::KeyPair;
pub use envelope::{
    decrypt, decrypt_with_options, encrypt, encrypt_with_cek, DecryptOptions, Jwe,
    ProtectedHeader, Recipient, RecipientHeader,
};
pub use error::{JweError, Result};
pub use keywrap::{
    AnonDecrypter, AnonEncrypter, AuthDecrypter, AuthEncrypter, AuthOptions, Decrypter,
    DirectDecrypter, DirectEncrypter, Encrypter,
};
pub use resolver::{
    resolve_x25519_auth_encrypters, resolve_x25519_encrypters, AgreementKey, Keyring, Resolver,
};
