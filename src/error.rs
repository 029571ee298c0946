use thiserror::Error;

/// Errors produced by the envelope engine.
///
/// Structural problems (`InvalidEnvelope`) carry detail because they say nothing
/// about key material. Every cryptographic failure collapses into
/// `DecryptionFailed`, whatever its cause.
#[derive(Error, Debug)]
pub enum JweError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("failed to decrypt")]
    DecryptionFailed,

    #[error("no encrypters supplied")]
    NoEncrypters,

    #[error("incompatible encrypters: all encrypters must use the same content encryption")]
    IncompatibleEncrypters,

    #[error("direct encryption supports exactly one recipient")]
    DirectRequiresSingleRecipient,

    #[error("unsupported content encryption: {0}")]
    UnsupportedEncryption(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("public key is not usable for X25519 key agreement")]
    InvalidPublicKey,

    #[error("encryption failed")]
    Encryption,

    #[error("could not resolve {0}")]
    Resolution(String),

    #[error("no X25519 key agreement key found for {0}")]
    NoSuitableKeys(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, JweError>;

/// Errors from the local key store used by the `jwecrypt` binary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No keypair found. Run `jwecrypt init` first.")]
    NoKeypairFound,

    #[error("Failed to write key file atomically")]
    AtomicWriteFailed(#[source] std::io::Error),

    #[error("Cannot determine home directory")]
    HomeDirNotFound,

    #[error("Keyring already has a key with id {0}")]
    KeyringEntryExists(String),
}
