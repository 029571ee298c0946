/// Integration tests: envelope round-trips through the public API.
///
/// Tests cover:
///   1. Anonymous, single recipient, with and without AAD
///   2. Anonymous, several recipients, each decrypting independently
///   3. Authenticated (ECDH-1PU), including sender binding and party info
///   4. Direct ("dir") encryption
///   5. Mixed key management algorithms in one envelope
///   6. JSON serialization and resolver-driven encryption
use jwecrypt::envelope::ProtectedHeader;
use jwecrypt::util::b64url_encode;
use jwecrypt::{
    decrypt, encrypt, resolve_x25519_auth_encrypters, resolve_x25519_encrypters, AgreementKey,
    AnonDecrypter, AnonEncrypter, AuthDecrypter, AuthEncrypter, AuthOptions, DirectDecrypter,
    DirectEncrypter, Encrypter, Jwe, JweError, KeyPair, Keyring,
};
use serde_json::json;

/// Fixed keypair with seed [42u8; 32], the sender.
fn alice() -> KeyPair {
    KeyPair::from_secret_bytes([42u8; 32])
}

/// Fixed keypair with seed [99u8; 32], the first recipient.
fn bob() -> KeyPair {
    KeyPair::from_secret_bytes([99u8; 32])
}

/// Fixed keypair with seed [7u8; 32], the second recipient.
fn carol() -> KeyPair {
    KeyPair::from_secret_bytes([7u8; 32])
}

fn as_dyn<E: Encrypter>(encrypters: &[E]) -> Vec<&dyn Encrypter> {
    encrypters.iter().map(|e| e as &dyn Encrypter).collect()
}

// ── Test 1: Anonymous single recipient ─────────────────────────────────────

#[test]
fn test_anonymous_round_trip() {
    let to_bob = AnonEncrypter::new(*bob().public_key()).with_kid("did:example:bob#key-1");
    let jwe = encrypt(b"hello bob", &[&to_bob], None, None).expect("encrypt should succeed");

    let plaintext = decrypt(&jwe, &AnonDecrypter::new(bob())).expect("bob should decrypt");
    assert_eq!(plaintext, b"hello bob");

    let err = decrypt(&jwe, &AnonDecrypter::new(carol())).unwrap_err();
    assert!(
        matches!(err, JweError::DecryptionFailed),
        "a non-recipient must get a uniform failure, got: {:?}",
        err
    );
}

#[test]
fn test_anonymous_round_trip_with_aad() {
    let to_bob = AnonEncrypter::new(*bob().public_key());
    let jwe = encrypt(b"bound", &[&to_bob], None, Some(&b"routing-context"[..]))
        .expect("encrypt should succeed");
    assert!(jwe.aad.is_some(), "aad must be carried in the envelope");

    let plaintext = decrypt(&jwe, &AnonDecrypter::new(bob())).expect("bob should decrypt");
    assert_eq!(plaintext, b"bound");
}

#[test]
fn test_empty_plaintext_round_trip() {
    let to_bob = AnonEncrypter::new(*bob().public_key());
    let jwe = encrypt(b"", &[&to_bob], None, None).expect("encrypt should succeed");
    let plaintext = decrypt(&jwe, &AnonDecrypter::new(bob())).expect("bob should decrypt");
    assert!(plaintext.is_empty());
}

// ── Test 2: Several recipients ─────────────────────────────────────────────

#[test]
fn test_multi_recipient_round_trip() {
    let encrypters = vec![
        AnonEncrypter::new(*bob().public_key()).with_kid("bob#1"),
        AnonEncrypter::new(*carol().public_key()).with_kid("carol#1"),
        AnonEncrypter::new(*alice().public_key()).with_kid("alice#1"),
    ];
    let jwe = encrypt(b"to all three", &as_dyn(&encrypters), None, None)
        .expect("encrypt should succeed");
    assert_eq!(jwe.recipients.as_ref().map(Vec::len), Some(3));

    for keypair in [bob(), carol(), alice()] {
        let plaintext = decrypt(&jwe, &AnonDecrypter::new(keypair))
            .expect("every recipient should decrypt");
        assert_eq!(plaintext, b"to all three");
    }
}

#[test]
fn test_corrupted_entry_does_not_affect_others() {
    let encrypters = vec![
        AnonEncrypter::new(*bob().public_key()),
        AnonEncrypter::new(*carol().public_key()),
    ];
    let mut jwe = encrypt(b"resilient", &as_dyn(&encrypters), None, None)
        .expect("encrypt should succeed");
    let recipients = jwe.recipients.as_mut().expect("array form");
    recipients[0].encrypted_key = b64url_encode([0xAAu8; 32]);

    assert!(matches!(
        decrypt(&jwe, &AnonDecrypter::new(bob())),
        Err(JweError::DecryptionFailed)
    ));
    assert_eq!(
        decrypt(&jwe, &AnonDecrypter::new(carol())).expect("carol's entry is untouched"),
        b"resilient"
    );
}

#[test]
fn test_malformed_entry_does_not_affect_others() {
    let encrypters = vec![
        AnonEncrypter::new(*bob().public_key()),
        AnonEncrypter::new(*carol().public_key()),
    ];
    let mut jwe = encrypt(b"still readable", &as_dyn(&encrypters), None, None)
        .expect("encrypt should succeed");
    let recipients = jwe.recipients.as_mut().expect("array form");
    recipients[1].encrypted_key = "!!not-b64!!".to_string();

    assert_eq!(
        decrypt(&jwe, &AnonDecrypter::new(bob())).expect("bob's entry is untouched"),
        b"still readable"
    );

    let recipients = jwe.recipients.as_mut().expect("array form");
    recipients[1].encrypted_key = b64url_encode([0xAAu8; 32]);
    recipients[1].header.apu = Some("***".to_string());
    assert_eq!(
        decrypt(&jwe, &AnonDecrypter::new(bob())).expect("garbled party info elsewhere is skipped"),
        b"still readable"
    );
}

// ── Test 3: Authenticated ──────────────────────────────────────────────────

fn auth_to(recipient: &KeyPair, kid: &str) -> AuthEncrypter {
    AuthEncrypter::new(
        *recipient.public_key(),
        alice(),
        AuthOptions {
            kid: Some(kid.to_string()),
            skid: Some("did:example:alice#key-1".to_string()),
            ..Default::default()
        },
    )
    .expect("options are valid")
}

#[test]
fn test_authenticated_round_trip() {
    let to_bob = auth_to(&bob(), "did:example:bob#key-1");
    let jwe = encrypt(b"from alice", &[&to_bob], None, None).expect("encrypt should succeed");

    let header = jwe.protected_header().expect("protected header decodes");
    assert_eq!(header["skid"], json!("did:example:alice#key-1"));

    let entry = jwe.header.as_ref().expect("flattened single recipient");
    assert_eq!(entry.alg, "ECDH-1PU+XC20PKW");
    assert_eq!(entry.apu.as_deref(), Some(b64url_encode("did:example:alice#key-1").as_str()));
    assert_eq!(entry.apv.as_deref(), Some(b64url_encode("did:example:bob#key-1").as_str()));

    let plaintext = decrypt(&jwe, &AuthDecrypter::new(bob(), *alice().public_key()))
        .expect("bob should decrypt alice's message");
    assert_eq!(plaintext, b"from alice");
}

#[test]
fn test_authenticated_wrong_sender_fails() {
    let to_bob = auth_to(&bob(), "bob#1");
    let jwe = encrypt(b"from alice", &[&to_bob], None, None).expect("encrypt should succeed");

    let err = decrypt(&jwe, &AuthDecrypter::new(bob(), *carol().public_key())).unwrap_err();
    assert!(
        matches!(err, JweError::DecryptionFailed),
        "claiming the wrong sender must fail uniformly, got: {:?}",
        err
    );
}

#[test]
fn test_authenticated_multi_recipient_has_no_skid() {
    let encrypters = vec![auth_to(&bob(), "bob#1"), auth_to(&carol(), "carol#1")];
    let jwe = encrypt(b"group", &as_dyn(&encrypters), None, None).expect("encrypt should succeed");
    let header = jwe.protected_header().expect("protected header decodes");
    assert!(!header.contains_key("skid"));

    for keypair in [bob(), carol()] {
        let plaintext = decrypt(&jwe, &AuthDecrypter::new(keypair, *alice().public_key()))
            .expect("each recipient should decrypt");
        assert_eq!(plaintext, b"group");
    }
}

// ── Test 4: Direct ─────────────────────────────────────────────────────────

#[test]
fn test_direct_round_trip() {
    let key = [0x5Au8; 32];
    let jwe = encrypt(b"pre-shared", &[&DirectEncrypter::new(key)], None, None)
        .expect("encrypt should succeed");
    let header = jwe.protected_header().expect("protected header decodes");
    assert_eq!(header["alg"], json!("dir"));
    assert!(jwe.recipient_entries().is_empty());

    let plaintext = decrypt(&jwe, &DirectDecrypter::new(key)).expect("key holder should decrypt");
    assert_eq!(plaintext, b"pre-shared");
}

// ── Test 5: Mixed algorithms ───────────────────────────────────────────────

#[test]
fn test_mixed_anonymous_and_authenticated_recipients() {
    let to_bob = AnonEncrypter::new(*bob().public_key());
    let to_carol = auth_to(&carol(), "carol#1");
    let jwe = encrypt(b"mixed", &[&to_bob, &to_carol], None, None).expect("encrypt should succeed");

    assert_eq!(
        decrypt(&jwe, &AnonDecrypter::new(bob())).expect("bob via ECDH-ES"),
        b"mixed"
    );
    assert_eq!(
        decrypt(&jwe, &AuthDecrypter::new(carol(), *alice().public_key()))
            .expect("carol via ECDH-1PU"),
        b"mixed"
    );
    assert!(matches!(
        decrypt(&jwe, &AnonDecrypter::new(carol())),
        Err(JweError::DecryptionFailed)
    ));
}

// ── Test 6: JSON and resolver ──────────────────────────────────────────────

#[test]
fn test_json_round_trip_preserves_decryptability() {
    let mut fields = ProtectedHeader::new();
    fields.insert("typ".into(), json!("application/didcomm-encrypted+json"));
    let to_bob = AnonEncrypter::new(*bob().public_key());
    let jwe = encrypt(b"over the wire", &[&to_bob], Some(&fields), None)
        .expect("encrypt should succeed");

    let json = jwe.to_json().expect("serialize");
    let parsed = Jwe::from_json(&json).expect("parse");
    assert_eq!(parsed, jwe);
    assert_eq!(
        decrypt(&parsed, &AnonDecrypter::new(bob())).expect("decrypt after JSON"),
        b"over the wire"
    );
}

#[test]
fn test_resolver_driven_encryption() {
    let mut keyring = Keyring::new();
    keyring
        .add("did:example:bob", AgreementKey::x25519("did:example:bob#key-1", bob().public_key()))
        .expect("add bob");
    keyring
        .add(
            "did:example:carol",
            AgreementKey::x25519("did:example:carol#key-1", carol().public_key()),
        )
        .expect("add carol");
    let ids = ["did:example:bob", "did:example:carol"];

    let anon = resolve_x25519_encrypters(&keyring, &ids).expect("resolve anonymous");
    let jwe = encrypt(b"resolved", &as_dyn(&anon), None, None).expect("encrypt");
    let kids: Vec<Option<String>> = jwe
        .recipient_entries()
        .iter()
        .map(|r| r.header.kid.clone())
        .collect();
    assert_eq!(
        kids,
        vec![
            Some("did:example:bob#key-1".to_string()),
            Some("did:example:carol#key-1".to_string())
        ]
    );
    assert_eq!(decrypt(&jwe, &AnonDecrypter::new(carol())).expect("carol"), b"resolved");

    let auth = resolve_x25519_auth_encrypters(&keyring, &ids, &alice(), Some("alice#1"))
        .expect("resolve authenticated");
    let jwe = encrypt(b"resolved, signed", &as_dyn(&auth), None, None).expect("encrypt");
    assert_eq!(
        decrypt(&jwe, &AuthDecrypter::new(bob(), *alice().public_key())).expect("bob"),
        b"resolved, signed"
    );
}
