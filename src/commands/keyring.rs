use comfy_table::{Cell, Color, Table};
use owo_colors::{OwoColorize, Stream::Stdout};

use crate::cli::{KeyringAddArgs, KeyringCommand, KeyringRemoveArgs};
use jwecrypt::crypto::public_key_from_slice;
use jwecrypt::keys::{fingerprint, store};
use jwecrypt::util::b64url_decode;
use jwecrypt::AgreementKey;

pub fn run_keyring(command: KeyringCommand) -> anyhow::Result<()> {
    match command {
        KeyringCommand::Add(args) => run_add(args),
        KeyringCommand::List => run_list(),
        KeyringCommand::Remove(args) => run_remove(args),
    }
}

fn run_add(args: KeyringAddArgs) -> anyhow::Result<()> {
    let bytes = b64url_decode(args.public_key.trim(), "public key")?;
    let public_key = public_key_from_slice(&bytes)?;
    let kid = args.kid.unwrap_or_else(|| args.id.clone());

    store::ensure_key_dir()?;
    let mut keyring = store::load_keyring()?;
    keyring.add(&args.id, AgreementKey::x25519(kid.clone(), &public_key))?;
    store::save_keyring(&keyring)?;

    println!(
        "Added {} for {} ({})",
        kid.if_supports_color(Stdout, |t| t.cyan()),
        args.id,
        fingerprint::short_fingerprint(&public_key)
    );
    Ok(())
}

fn run_list() -> anyhow::Result<()> {
    let keyring = store::load_keyring()?;
    if keyring.is_empty() {
        println!(
            "{}",
            "Keyring is empty. Add a recipient with jwecrypt keyring add."
                .if_supports_color(Stdout, |t| t.yellow())
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Identifier", "Key ID", "Curve", "Fingerprint"]);
    for (id, keys) in keyring.entries() {
        for key in keys {
            let (fingerprint_cell, curve_cell) = match key.x25519_public_key() {
                Some(public_key) => (
                    Cell::new(fingerprint::short_fingerprint(&public_key)),
                    Cell::new(&key.curve).fg(Color::Green),
                ),
                None => (Cell::new("-"), Cell::new(&key.curve).fg(Color::DarkGrey)),
            };
            table.add_row(vec![
                Cell::new(id),
                Cell::new(&key.id),
                curve_cell,
                fingerprint_cell,
            ]);
        }
    }
    println!("{table}");
    Ok(())
}

fn run_remove(args: KeyringRemoveArgs) -> anyhow::Result<()> {
    let mut keyring = store::load_keyring()?;
    if !keyring.remove(&args.id) {
        anyhow::bail!("No keyring entry for {}", args.id);
    }
    store::save_keyring(&keyring)?;
    println!("Removed {}", args.id);
    Ok(())
}
