//! Single-step concatenation KDF (NIST SP 800-56A, JWA section 4.6) over SHA-256.
//!
//! ```text
//! K(i)      = SHA-256( counter_i || Z || OtherInfo )      counter_1 = 1, u32 BE
//! OtherInfo = len||AlgorithmID || len||PartyUInfo || len||PartyVInfo || keydatalen
//! ```
//!
//! Every `len` and `keydatalen` (in bits) is a 32-bit big-endian integer.
//! Absent party info is encoded as a zero length with no data.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// SHA-256 output size in bytes.
const DIGEST_SIZE: usize = 32;

/// Derive an `N`-byte key from `shared_secret`.
///
/// The requested output length is part of `OtherInfo`, so a 16-byte and a
/// 32-byte derivation from the same inputs are unrelated. Blocks are
/// concatenated until `N` bytes exist and the final block is truncated.
pub fn concat_kdf<const N: usize>(
    shared_secret: &[u8],
    algorithm_id: &str,
    party_u_info: Option<&[u8]>,
    party_v_info: Option<&[u8]>,
) -> Zeroizing<[u8; N]> {
    let key_data_len = (N * 8) as u32;
    let other_info = other_info(algorithm_id.as_bytes(), party_u_info, party_v_info, key_data_len);

    let mut output = Zeroizing::new([0u8; N]);
    for (round, chunk) in output.chunks_mut(DIGEST_SIZE).enumerate() {
        let counter = (round + 1) as u32;
        let block = Sha256::new()
            .chain_update(counter.to_be_bytes())
            .chain_update(shared_secret)
            .chain_update(&other_info)
            .finalize();
        chunk.copy_from_slice(&block[..chunk.len()]);
    }
    output
}

fn other_info(
    algorithm_id: &[u8],
    party_u_info: Option<&[u8]>,
    party_v_info: Option<&[u8]>,
    key_data_len: u32,
) -> Vec<u8> {
    let party_u_info = party_u_info.unwrap_or_default();
    let party_v_info = party_v_info.unwrap_or_default();
    let mut info = Vec::with_capacity(16 + algorithm_id.len() + party_u_info.len() + party_v_info.len());
    for field in [algorithm_id, party_u_info, party_v_info] {
        info.extend_from_slice(&(field.len() as u32).to_be_bytes());
        info.extend_from_slice(field);
    }
    info.extend_from_slice(&key_data_len.to_be_bytes());
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const ES: &str = "ECDH-ES+XC20PKW";

    #[test]
    fn test_regression_vector_zero_secret() {
        let kek = concat_kdf::<32>(&[0u8; 32], ES, None, None);
        assert_eq!(
            hex::encode(*kek),
            "f5a059c912f987ac09c1af7e167301d7c8d82aa2743054f76f11c9def8b528fe"
        );
    }

    #[test]
    fn test_regression_vector_with_party_info() {
        let secret: Vec<u8> = (0u8..64).collect();
        let kek = concat_kdf::<32>(&secret, "ECDH-1PU+XC20PKW", Some(&b"Alice"[..]), Some(&b"Bob"[..]));
        assert_eq!(
            hex::encode(*kek),
            "c507ae39763477b2a56466b3cd588f0bcc221b5a3148ee5d1b1e0ae6e104fec5"
        );
    }

    #[test]
    fn test_multi_block_output() {
        let key = concat_kdf::<64>(&[0u8; 32], ES, None, None);
        assert_eq!(
            hex::encode(*key),
            "6179b3ea1d4cd35ef7842b22eefd34a46bff2546712e85b41d079c407ea051b4\
             111db9388d2d24511c5adc6e03df3eba2efa588f4ed9e0ecbf5205c538a18fd2"
        );
    }

    #[test]
    fn test_truncated_output() {
        let key = concat_kdf::<16>(&[0u8; 32], ES, None, None);
        assert_eq!(hex::encode(*key), "c1603e85b38a70f2dec42d449cd78459");
    }

    #[test]
    fn test_deterministic() {
        let a = concat_kdf::<32>(&[5u8; 64], ES, Some(&b"u"[..]), Some(&b"v"[..]));
        let b = concat_kdf::<32>(&[5u8; 64], ES, Some(&b"u"[..]), Some(&b"v"[..]));
        assert_eq!(*a, *b, "identical inputs must give identical keys");
    }

    #[test]
    fn test_each_context_field_changes_output() {
        let base = concat_kdf::<32>(&[5u8; 32], ES, Some(&b"u"[..]), Some(&b"v"[..]));
        let other_alg = concat_kdf::<32>(&[5u8; 32], "ECDH-1PU+XC20PKW", Some(&b"u"[..]), Some(&b"v"[..]));
        let other_apu = concat_kdf::<32>(&[5u8; 32], ES, Some(&b"x"[..]), Some(&b"v"[..]));
        let other_apv = concat_kdf::<32>(&[5u8; 32], ES, Some(&b"u"[..]), Some(&b"x"[..]));
        assert_ne!(*base, *other_alg, "algorithm id must domain-separate");
        assert_ne!(*base, *other_apu, "party U info must domain-separate");
        assert_ne!(*base, *other_apv, "party V info must domain-separate");
    }

    #[test]
    fn test_party_info_is_directional() {
        // Swapping U and V must not collide
        let uv = concat_kdf::<32>(&[5u8; 32], ES, Some(&b"alice"[..]), Some(&b"bob"[..]));
        let vu = concat_kdf::<32>(&[5u8; 32], ES, Some(&b"bob"[..]), Some(&b"alice"[..]));
        assert_ne!(*uv, *vu);
    }

    #[test]
    fn test_absent_and_empty_party_info_match() {
        let absent = concat_kdf::<32>(&[5u8; 32], ES, None, None);
        let empty = concat_kdf::<32>(&[5u8; 32], ES, Some(&b""[..]), Some(&b""[..]));
        assert_eq!(*absent, *empty, "absent party info is encoded as zero length");
    }
}
