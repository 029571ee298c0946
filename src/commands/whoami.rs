use jwecrypt::keys::{fingerprint, store};
use jwecrypt::util::b64url_encode;

fn try_copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => clipboard.set_text(text).is_ok(),
        Err(_) => false,
    }
}

pub fn run_whoami() -> anyhow::Result<()> {
    let keypair = super::load_own_keypair()?;
    let public_key = b64url_encode(keypair.public_key());
    let fingerprint = fingerprint::short_fingerprint(keypair.public_key());
    let key_path = store::secret_key_path()?;

    println!("Public Key:  {}", public_key);
    println!("Fingerprint: {}", fingerprint);
    println!("Key file:    {}", key_path.display());
    println!();

    if try_copy_to_clipboard(&public_key) {
        println!("Public key copied to clipboard.");
    } else {
        println!("(Clipboard unavailable, copy the public key manually)");
    }

    Ok(())
}
