pub mod decrypt;
pub mod encrypt;
pub mod init;
pub mod inspect;
pub mod keyring;
pub mod whoami;

use std::io::{self, IsTerminal, Read};

use anyhow::Context;
use zeroize::Zeroizing;

use jwecrypt::keys::store;
use jwecrypt::KeyPair;

/// Read the whole input file, or stdin when no path (or `-`) is given.
pub(crate) fn read_input(path: Option<&str>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Load the local keypair, prompting for the passphrase if the key file is sealed.
pub(crate) fn load_own_keypair() -> anyhow::Result<KeyPair> {
    store::load_keypair(prompt_passphrase)
}

fn prompt_passphrase() -> anyhow::Result<Zeroizing<String>> {
    // Input may be piped in, so only the prompt stream needs a terminal
    if !io::stderr().is_terminal() {
        anyhow::bail!("Key file is passphrase-protected; run interactively to unlock it");
    }
    let passphrase = dialoguer::Password::new()
        .with_prompt("Enter key passphrase")
        .interact()
        .map_err(|e| anyhow::anyhow!("Passphrase prompt failed: {}", e))?;
    Ok(Zeroizing::new(passphrase))
}
