use std::io::{self, Write};

use anyhow::Context;
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::DecryptArgs;
use jwecrypt::keys::store;
use jwecrypt::resolver::resolve_x25519_key;
use jwecrypt::{decrypt, AnonDecrypter, AuthDecrypter, Jwe, JweError};

pub fn run_decrypt(args: DecryptArgs) -> anyhow::Result<()> {
    // ── 1. Parse the envelope ──
    let input = super::read_input(args.input.as_deref())?;
    let text = std::str::from_utf8(&input).context("Input is not a UTF-8 JWE")?;
    let jwe = Jwe::from_json(text.trim())?;

    // ── 2. Decrypt ──
    let keypair = super::load_own_keypair()?;
    let plaintext = Zeroizing::new(match args.from {
        Some(sender_id) => decrypt_from(&jwe, keypair, &sender_id)?,
        None => decrypt(&jwe, &AnonDecrypter::new(keypair))?,
    });

    // ── 3. Emit ──
    let mut stdout = io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.flush()?;
    Ok(())
}

/// Try every X25519 key published for `sender_id`, the one named by the
/// envelope's `skid` first.
fn decrypt_from(jwe: &Jwe, keypair: jwecrypt::KeyPair, sender_id: &str) -> anyhow::Result<Vec<u8>> {
    let keyring = store::load_keyring()?;
    let mut senders = resolve_x25519_key(&keyring, sender_id)?;
    let skid = jwe
        .protected_header()?
        .get("skid")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(skid) = &skid {
        senders.sort_by_key(|key| key.kid != *skid);
    }

    for sender in senders {
        debug!(kid = %sender.kid, "trying sender key");
        match decrypt(jwe, &AuthDecrypter::new(keypair.clone(), sender.public_key)) {
            Ok(plaintext) => return Ok(plaintext),
            Err(JweError::DecryptionFailed) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(JweError::DecryptionFailed.into())
}
