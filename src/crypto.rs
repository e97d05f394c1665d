//! Ziftr proof-of-work digest pipeline
//!
//! The digest of an 80-byte block header is computed as a Keccak-512 seed
//! followed by four chained 512-bit transforms (BLAKE, Groestl, JH, Skein).
//! The order of the four transforms is selected per header from a fixed
//! 24-row permutation table, indexed by the first word of the seed digest,
//! so the pipeline shape itself depends on the input. Only the first 32
//! bytes of the final working digest are exposed.
//!
//! Each transform consumes the previous 512-bit output directly, with no
//! domain separation beyond the primitives' own padding. That chaining is
//! part of the consensus contract and must not be altered.

use crate::types::Header;
use digest::Digest;

/// Size of the internal working digest in bytes
pub const WORKING_DIGEST_SIZE: usize = 64;
/// Size of the exposed proof-of-work digest in bytes
pub const POW_DIGEST_SIZE: usize = 32;

/// The four chain transforms in their fixed index assignment
/// (0 = BLAKE, 1 = Groestl, 2 = JH, 3 = Skein)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Blake,
    Groestl,
    Jh,
    Skein,
}

use Transform::{Blake, Groestl, Jh, Skein};

/// Pre-computed table of transform permutations
///
/// Exactly the 24 permutations of the four transforms, in the table order
/// established by existing chain data. Reordering any row breaks
/// compatibility with every block already mined.
pub const CHAIN_ORDER: [[Transform; 4]; 24] = [
    [Blake, Groestl, Jh, Skein],
    [Blake, Groestl, Skein, Jh],
    [Blake, Jh, Groestl, Skein],
    [Blake, Jh, Skein, Groestl],
    [Blake, Skein, Groestl, Jh],
    [Blake, Skein, Jh, Groestl],
    [Groestl, Blake, Jh, Skein],
    [Groestl, Blake, Skein, Jh],
    [Groestl, Jh, Blake, Skein],
    [Groestl, Jh, Skein, Blake],
    [Groestl, Skein, Blake, Jh],
    [Groestl, Skein, Jh, Blake],
    [Jh, Blake, Groestl, Skein],
    [Jh, Blake, Skein, Groestl],
    [Jh, Groestl, Blake, Skein],
    [Jh, Groestl, Skein, Blake],
    [Jh, Skein, Blake, Groestl],
    [Jh, Skein, Groestl, Blake],
    [Skein, Blake, Groestl, Jh],
    [Skein, Blake, Jh, Groestl],
    [Skein, Groestl, Blake, Jh],
    [Skein, Groestl, Jh, Blake],
    [Skein, Jh, Blake, Groestl],
    [Skein, Jh, Groestl, Blake],
];

impl Transform {
    /// Apply this transform to the 64-byte working digest in place
    fn apply(self, hash: &mut [u8; WORKING_DIGEST_SIZE]) {
        match self {
            Blake => blake512(hash),
            Groestl => groestl512(hash),
            Jh => jh512(hash),
            Skein => skein512(hash),
        }
    }
}

/// Compute the ziftr proof-of-work digest of a block header
///
/// Pure and deterministic: the same header always produces the same 32-byte
/// digest.
pub fn pow_hash(header: &Header) -> [u8; POW_DIGEST_SIZE] {
    let mut hash = keccak512(header.bytes());

    for transform in CHAIN_ORDER[chain_order_index(&hash)] {
        transform.apply(&mut hash);
    }

    let mut state = [0u8; POW_DIGEST_SIZE];
    state.copy_from_slice(&hash[..POW_DIGEST_SIZE]);
    state
}

/// Select the row of [`CHAIN_ORDER`] for a seed digest
///
/// The first seed word, read little-endian, taken modulo the 24 table rows.
fn chain_order_index(seed: &[u8; WORKING_DIGEST_SIZE]) -> usize {
    let word = u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]);
    word as usize % CHAIN_ORDER.len()
}

/// Keccak-512 seed hash over the full header
///
/// This is the original Keccak padding (sph-style), not SHA3-512, and the
/// streaming absorb accepts the whole 80-byte input. Fixed-64-byte-input
/// Keccak variants are incompatible here.
fn keccak512(data: &[u8]) -> [u8; WORKING_DIGEST_SIZE] {
    let mut out = [0u8; WORKING_DIGEST_SIZE];
    out.copy_from_slice(&sha3::Keccak512::digest(data));
    out
}

fn blake512(hash: &mut [u8; WORKING_DIGEST_SIZE]) {
    // blake-hash predates digest 0.10, so its own trait import applies here
    use blake_hash::Digest as _;
    let out = blake_hash::Blake512::digest(&hash[..]);
    hash.copy_from_slice(&out);
}

fn groestl512(hash: &mut [u8; WORKING_DIGEST_SIZE]) {
    let out = groestl::Groestl512::digest(&hash[..]);
    hash.copy_from_slice(&out);
}

fn jh512(hash: &mut [u8; WORKING_DIGEST_SIZE]) {
    let out = jh::Jh512::digest(&hash[..]);
    hash.copy_from_slice(&out);
}

fn skein512(hash: &mut [u8; WORKING_DIGEST_SIZE]) {
    let out = skein::Skein512::<digest::consts::U64>::digest(&hash[..]);
    hash.copy_from_slice(&out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_keccak512_is_original_keccak() {
        // Published Keccak-512 empty-input vector; SHA3-512 padding would
        // produce a different digest
        let digest = keccak512(&[]);
        assert_eq!(
            hex::encode(digest),
            "0eab42de4c3ceb9235fc91acffe746b29c29a8c366b7c60e4e67c466f36a4304\
             c00fa9caf9d87976ba469bcbe06713b435f091ef2769fb160cdab33d3670680e"
        );
    }

    #[test]
    fn test_keccak512_accepts_full_header() {
        let digest = keccak512(&[0u8; Header::SIZE]);
        assert_eq!(digest.len(), WORKING_DIGEST_SIZE);
        assert_ne!(digest, keccak512(&[0u8; WORKING_DIGEST_SIZE]));
    }

    #[test]
    fn test_chain_order_table_is_complete() {
        let mut seen = HashSet::new();
        for row in CHAIN_ORDER {
            let indices: Vec<u8> = row.iter().map(|t| *t as u8).collect();

            let mut sorted = indices.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3], "row {:?} is not a permutation", row);

            assert!(seen.insert(indices), "duplicate row {:?}", row);
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_chain_order_table_leading_rows() {
        // Table order is fixed by existing chain data
        assert_eq!(CHAIN_ORDER[0], [Blake, Groestl, Jh, Skein]);
        assert_eq!(CHAIN_ORDER[1], [Blake, Groestl, Skein, Jh]);
        assert_eq!(CHAIN_ORDER[23], [Skein, Jh, Groestl, Blake]);
    }

    #[test]
    fn test_chain_order_index_uses_first_word_only() {
        let mut seed_a = [0u8; WORKING_DIGEST_SIZE];
        let mut seed_b = [0xffu8; WORKING_DIGEST_SIZE];
        seed_a[..4].copy_from_slice(&100u32.to_le_bytes());
        seed_b[..4].copy_from_slice(&100u32.to_le_bytes());

        assert_eq!(chain_order_index(&seed_a), chain_order_index(&seed_b));
        assert_eq!(chain_order_index(&seed_a), 100 % 24);
    }

    #[test]
    fn test_pow_hash_deterministic() {
        let header = Header::from_bytes(&[0x42u8; Header::SIZE]).unwrap();
        assert_eq!(pow_hash(&header), pow_hash(&header));
    }

    #[test]
    fn test_pow_hash_is_not_truncated_seed() {
        // The chain transforms must actually run after the seed hash
        let header = Header::from_bytes(&[0u8; Header::SIZE]).unwrap();
        let seed = keccak512(header.bytes());
        assert_ne!(pow_hash(&header)[..], seed[..POW_DIGEST_SIZE]);
    }

    #[test]
    fn test_pow_hash_sensitive_to_every_word() {
        let base = Header::from_bytes(&[0u8; Header::SIZE]).unwrap();
        let base_hash = pow_hash(&base);

        for word in 0..Header::WORDS {
            let mut header = base.clone();
            header.set_word(word, 1);
            assert_ne!(pow_hash(&header), base_hash, "word {} ignored", word);
        }
    }

    proptest! {
        #[test]
        fn prop_pow_hash_deterministic(bytes in any::<[u8; Header::SIZE]>()) {
            let header = Header::from_bytes(&bytes).unwrap();
            prop_assert_eq!(pow_hash(&header), pow_hash(&header));
        }

        #[test]
        fn prop_chain_order_index_in_range(seed in any::<[u8; WORKING_DIGEST_SIZE]>()) {
            prop_assert!(chain_order_index(&seed) < CHAIN_ORDER.len());
        }
    }
}
