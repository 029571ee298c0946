use anyhow::Context;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::crypto::passphrase::{is_sealed_key_file, open_secret_key};
use crate::crypto::KeyPair;
use crate::error::StoreError;
use crate::resolver::Keyring;
use crate::util::{b64url_decode, b64url_encode};

/// Environment variable overriding the key directory.
pub const HOME_ENV: &str = "JWECRYPT_HOME";

pub fn key_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
    Ok(home.join(".jwecrypt"))
}

pub fn secret_key_path() -> anyhow::Result<PathBuf> {
    Ok(key_dir()?.join("secret_key"))
}

pub fn keyring_path() -> anyhow::Result<PathBuf> {
    Ok(key_dir()?.join("keyring.json"))
}

pub fn ensure_key_dir() -> anyhow::Result<()> {
    let dir = key_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {} directory", dir.display()))?;
    Ok(())
}

pub fn keypair_exists() -> anyhow::Result<bool> {
    Ok(secret_key_path()?.exists())
}

/// Plaintext key file contents: the base64url secret and a newline.
pub fn encode_plain_secret(keypair: &KeyPair) -> Zeroizing<Vec<u8>> {
    let secret = keypair.secret_bytes();
    let mut encoded = b64url_encode(&*secret).into_bytes();
    encoded.push(b'\n');
    Zeroizing::new(encoded)
}

/// Write a secret key file atomically (temp file, then rename) with 0600 permissions.
///
/// `contents` is either [`encode_plain_secret`] output or a sealed envelope
/// from [`crate::crypto::passphrase::seal_secret_key`]. The temp file lives
/// in the destination directory so the rename never crosses filesystems.
pub fn write_secret_key_atomic(contents: &[u8], dest: &Path) -> anyhow::Result<()> {
    write_atomic(contents, dest, ".secret_key.tmp", true)
}

fn write_atomic(contents: &[u8], dest: &Path, tmp_name: &str, private: bool) -> anyhow::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Destination path has no parent directory"))?;
    let tmp = parent.join(tmp_name);

    std::fs::write(&tmp, contents).map_err(StoreError::AtomicWriteFailed)?;

    // Restrict before the rename so the final path is never world-readable
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::AtomicWriteFailed(e).into());
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    if let Err(e) = std::fs::rename(&tmp, dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(StoreError::AtomicWriteFailed(e).into());
    }
    Ok(())
}

/// Load the keypair from `path`.
///
/// A sealed key file asks `passphrase` for the passphrase; a plaintext one
/// never calls it. The 0600 permission check runs before any key bytes are read.
pub fn load_keypair_from<F>(path: &Path, passphrase: F) -> anyhow::Result<KeyPair>
where
    F: FnOnce() -> anyhow::Result<Zeroizing<String>>,
{
    if !path.exists() {
        return Err(StoreError::NoKeypairFound.into());
    }
    check_key_permissions(path)?;
    let raw = Zeroizing::new(
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
    );

    if is_sealed_key_file(&raw) {
        let passphrase = passphrase()?;
        let secret = open_secret_key(&raw, &passphrase)?;
        return Ok(KeyPair::from_secret_bytes(*secret));
    }

    let text = std::str::from_utf8(&raw).context("Key file is neither sealed nor text")?;
    let secret = Zeroizing::new(
        b64url_decode(text.trim(), "secret_key")
            .map_err(|e| anyhow::anyhow!("Failed to load keypair: {}", e))?,
    );
    KeyPair::from_secret_slice(&secret).map_err(|e| anyhow::anyhow!("Failed to load keypair: {}", e))
}

/// Load the keypair from the default secret key path.
pub fn load_keypair<F>(passphrase: F) -> anyhow::Result<KeyPair>
where
    F: FnOnce() -> anyhow::Result<Zeroizing<String>>,
{
    load_keypair_from(&secret_key_path()?, passphrase)
}

/// Whether the key file at `path` is passphrase-protected.
pub fn is_sealed(path: &Path) -> bool {
    std::fs::read(path)
        .map(|raw| is_sealed_key_file(&raw))
        .unwrap_or(false)
}

/// Load a keyring. A missing file is an empty keyring.
pub fn load_keyring_from(path: &Path) -> anyhow::Result<Keyring> {
    if !path.exists() {
        return Ok(Keyring::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keyring from {}", path.display()))?;
    Keyring::from_json(&json).with_context(|| format!("Malformed keyring at {}", path.display()))
}

pub fn load_keyring() -> anyhow::Result<Keyring> {
    load_keyring_from(&keyring_path()?)
}

pub fn save_keyring_to(keyring: &Keyring, path: &Path) -> anyhow::Result<()> {
    let json = keyring.to_json_pretty().context("Failed to serialize keyring")?;
    write_atomic(json.as_bytes(), path, ".keyring.json.tmp", false)
        .with_context(|| format!("Failed to write keyring to {}", path.display()))
}

pub fn save_keyring(keyring: &Keyring) -> anyhow::Result<()> {
    save_keyring_to(keyring, &keyring_path()?)
}

/// Check that the key file has exactly 0600 permissions (Unix only).
///
/// The error message includes the remediation command (`chmod 600 <path>`).
#[cfg(unix)]
pub fn check_key_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        anyhow::bail!(
            "Key file {} has insecure permissions {:04o} (expected 0600). Fix with: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        );
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn check_key_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
