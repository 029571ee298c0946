use anyhow::Context;
use comfy_table::{Cell, Color, Table};
use owo_colors::{OwoColorize, Stream::Stdout};
use serde_json::Value;

use crate::cli::InspectArgs;
use jwecrypt::util::b64url_decode;
use jwecrypt::Jwe;

/// Show the protected header and recipient entries of an envelope.
///
/// Only public structure is displayed; nothing is decrypted.
pub fn run_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let input = super::read_input(args.input.as_deref())?;
    let text = std::str::from_utf8(&input).context("Input is not a UTF-8 JWE")?;
    let jwe = Jwe::from_json(text.trim())?;
    let header = jwe.protected_header()?;

    // ── 1. Protected header ──
    println!("{}", "Protected header".if_supports_color(Stdout, |t| t.bold()));
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    for (name, value) in &header {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        table.add_row(vec![Cell::new(name), Cell::new(shown)]);
    }
    println!("{table}");

    if let Some(aad) = &jwe.aad {
        println!("AAD: {}", decode_for_display(aad));
    }
    println!();

    // ── 2. Recipients ──
    let entries = jwe.recipient_entries();
    if entries.is_empty() {
        println!(
            "{}",
            "No recipient entries (direct encryption)."
                .if_supports_color(Stdout, |t| t.yellow())
        );
        return Ok(());
    }

    println!("{}", "Recipients".if_supports_color(Stdout, |t| t.bold()));
    let mut table = Table::new();
    table.set_header(vec!["#", "alg", "kid", "apu", "apv", "epk"]);
    for (index, entry) in entries.iter().enumerate() {
        let header = &entry.header;
        let epk = header
            .epk
            .as_ref()
            .map(|epk| format!("{}/{}", epk.kty, epk.crv))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&header.alg).fg(Color::Cyan),
            Cell::new(header.kid.as_deref().unwrap_or("-")),
            Cell::new(optional_for_display(header.apu.as_deref())),
            Cell::new(optional_for_display(header.apv.as_deref())),
            Cell::new(epk),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn optional_for_display(value: Option<&str>) -> String {
    value.map(decode_for_display).unwrap_or_else(|| "-".to_string())
}

/// Decoded text when the field is base64url UTF-8, the raw field otherwise.
fn decode_for_display(value: &str) -> String {
    b64url_decode(value, "field")
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| value.to_string())
}
