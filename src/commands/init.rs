use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream::Stdout};
use zeroize::Zeroizing;

use crate::cli::InitArgs;
use jwecrypt::crypto::passphrase::{seal_secret_key, KdfParams};
use jwecrypt::keys::{fingerprint, store};
use jwecrypt::util::b64url_encode;
use jwecrypt::KeyPair;

const MIN_PASSPHRASE_LEN: usize = 8;

pub fn run_init(args: InitArgs) -> anyhow::Result<()> {
    // ── 1. Key directory ──
    store::ensure_key_dir().context("Failed to create key directory")?;
    let secret_key_path = store::secret_key_path()?;

    // ── 2. Overwrite guard ──
    if store::keypair_exists()? && !args.yes {
        let should_overwrite = prompt_overwrite(&secret_key_path)?;
        if !should_overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // ── 3. Generate and write ──
    let keypair = KeyPair::generate();
    if args.no_passphrase {
        store::write_secret_key_atomic(&store::encode_plain_secret(&keypair), &secret_key_path)
            .context("Failed to write keypair")?;
    } else {
        if !io::stdin().is_terminal() {
            anyhow::bail!("Use --no-passphrase for non-interactive init");
        }
        let passphrase = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter key passphrase (min {} chars)", MIN_PASSPHRASE_LEN))
                .with_confirmation("Confirm passphrase", "Passphrases don't match")
                .interact()
                .map_err(|e| anyhow::anyhow!("Passphrase prompt failed: {}", e))?,
        );
        if passphrase.len() < MIN_PASSPHRASE_LEN {
            anyhow::bail!("Passphrase must be at least {} characters", MIN_PASSPHRASE_LEN);
        }
        let sealed = seal_secret_key(&keypair.secret_bytes(), &passphrase, KdfParams::default())?;
        store::write_secret_key_atomic(&sealed, &secret_key_path)
            .context("Failed to write encrypted keypair")?;
    }

    // ── 4. Report ──
    println!(
        "{}",
        "Keypair generated successfully.".if_supports_color(Stdout, |t| t.green())
    );
    println!();
    println!("Public Key:  {}", b64url_encode(keypair.public_key()));
    println!("Fingerprint: {}", fingerprint::short_fingerprint(keypair.public_key()));
    let protection = if args.no_passphrase {
        "plaintext"
    } else {
        "passphrase-protected"
    };
    println!("Key file:    {} ({})", secret_key_path.display(), protection);
    println!();
    println!("Next: share your public key, and add recipients with 'jwecrypt keyring add'.");

    Ok(())
}

fn prompt_overwrite(existing_key_path: &Path) -> anyhow::Result<bool> {
    if !io::stdin().is_terminal() {
        eprintln!("Use --yes to confirm overwrite in non-interactive mode");
        return Ok(false);
    }

    // A sealed key cannot be fingerprinted without its passphrase
    let identifier = if store::is_sealed(existing_key_path) {
        "(encrypted)".to_string()
    } else {
        match store::load_keypair_from(existing_key_path, || {
            anyhow::bail!("unexpected passphrase request")
        }) {
            Ok(kp) => fingerprint::short_fingerprint(kp.public_key()),
            Err(_) => "(unreadable)".to_string(),
        }
    };

    eprint!(
        "Key {} already exists at {}. Overwrite? [y/N]: ",
        identifier,
        existing_key_path.display()
    );
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
