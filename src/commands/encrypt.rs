use serde_json::Value;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::EncryptArgs;
use jwecrypt::keys::store;
use jwecrypt::{
    encrypt, resolve_x25519_auth_encrypters, resolve_x25519_encrypters, Encrypter,
    ProtectedHeader,
};

pub fn run_encrypt(args: EncryptArgs) -> anyhow::Result<()> {
    // ── 1. Input and headers ──
    let plaintext = Zeroizing::new(super::read_input(args.input.as_deref())?);
    let fields = parse_header_fields(&args.headers)?;
    let aad = args.aad.as_deref().map(str::as_bytes);

    // ── 2. Resolve recipients ──
    let keyring = store::load_keyring()?;
    let ids: Vec<&str> = args.to.iter().map(String::as_str).collect();
    let encrypters: Vec<Box<dyn Encrypter>> = if args.auth {
        let sender = super::load_own_keypair()?;
        resolve_x25519_auth_encrypters(&keyring, &ids, &sender, args.skid.as_deref())?
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn Encrypter>)
            .collect()
    } else {
        resolve_x25519_encrypters(&keyring, &ids)?
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn Encrypter>)
            .collect()
    };
    info!(recipients = encrypters.len(), auth = args.auth, "encrypting");

    // ── 3. Build and print ──
    let refs: Vec<&dyn Encrypter> = encrypters.iter().map(|e| &**e).collect();
    let jwe = encrypt(&plaintext, &refs, Some(&fields), aad)?;
    let json = if args.pretty {
        jwe.to_json_pretty()?
    } else {
        jwe.to_json()?
    };
    println!("{}", json);
    Ok(())
}

/// Parse `KEY=VALUE` pairs. A value that parses as JSON is kept as JSON,
/// anything else becomes a string.
fn parse_header_fields(fields: &[String]) -> anyhow::Result<ProtectedHeader> {
    let mut header = ProtectedHeader::new();
    for field in fields {
        let (name, raw) = field
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Header field must be KEY=VALUE, got {}", field))?;
        if name.is_empty() {
            anyhow::bail!("Header field name must not be empty");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        header.insert(name.to_string(), value);
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_header_fields() {
        let fields = vec![
            "typ=application/didcomm-encrypted+json".to_string(),
            "n=5".to_string(),
            "flag=true".to_string(),
        ];
        let header = parse_header_fields(&fields).expect("fields should parse");
        assert_eq!(header["typ"], json!("application/didcomm-encrypted+json"));
        assert_eq!(header["n"], json!(5));
        assert_eq!(header["flag"], json!(true));
    }

    #[test]
    fn test_parse_header_fields_rejects_missing_equals() {
        assert!(parse_header_fields(&["typ".to_string()]).is_err());
        assert!(parse_header_fields(&["=x".to_string()]).is_err());
    }
}
