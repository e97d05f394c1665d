//! Core types for ziftr mining
//!
//! Fundamental types used throughout the mining client with proper validation,
//! binary encoding, and JSON serialization.

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version word bits carrying kernel data patched in from the first digest pass
pub const POK_DATA_MASK: u32 = 0xFFFF_0000;
/// Version word flag bit reserved by the proof-of-kernel scheme
pub const POK_BOOL_MASK: u32 = 0x0000_8000;

/// Block header to be mined (80 bytes, 20 little-endian 32-bit words)
///
/// Word 0 is the version field: the low 16 bits are the real block version,
/// the high 16 bits carry kernel data. Word 19 is the nonce. Bytes 4..75
/// (previous hash, merkle root, timestamp, bits) are opaque to the miner and
/// pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    bytes: [u8; Self::SIZE],
}

impl Header {
    /// Header size in bytes
    pub const SIZE: usize = 80;
    /// Number of 32-bit words in a header
    pub const WORDS: usize = 20;

    const VERSION_WORD: usize = 0;
    const NONCE_WORD: usize = 19;

    /// Create a header from exactly 80 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::header(format!(
                "Invalid header size: expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        let mut array = [0u8; Self::SIZE];
        array.copy_from_slice(bytes);
        Ok(Self { bytes: array })
    }

    /// Create a header from a 160-character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::header(format!("Invalid hex in header: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw header bytes
    pub fn bytes(&self) -> &[u8; Self::SIZE] {
        &self.bytes
    }

    /// Read a 32-bit word (little-endian)
    pub fn word(&self, index: usize) -> u32 {
        debug_assert!(index < Self::WORDS);
        LittleEndian::read_u32(&self.bytes[index * 4..])
    }

    /// Write a 32-bit word (little-endian)
    pub fn set_word(&mut self, index: usize, value: u32) {
        debug_assert!(index < Self::WORDS);
        LittleEndian::write_u32(&mut self.bytes[index * 4..], value);
    }

    /// Get the full version word, kernel data included
    pub fn version(&self) -> u32 {
        self.word(Self::VERSION_WORD)
    }

    /// Set the full version word
    pub fn set_version(&mut self, version: u32) {
        self.set_word(Self::VERSION_WORD, version);
    }

    /// Get the real block version with the kernel-data bits masked off
    pub fn real_version(&self) -> u32 {
        self.version() & !POK_DATA_MASK
    }

    /// Get the nonce word
    pub fn nonce(&self) -> Nonce {
        Nonce::new(self.word(Self::NONCE_WORD))
    }

    /// Set the nonce word
    pub fn set_nonce(&mut self, nonce: Nonce) {
        self.set_word(Self::NONCE_WORD, nonce.value());
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Header {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Header {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Header::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Mining target representing the difficulty threshold
///
/// A 256-bit upper bound stored as 8 little-endian 32-bit words with word 7
/// most significant, matching the word layout of the proof-of-work digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    words: [u32; 8],
}

impl Target {
    /// Create a new target from 8 words, word 7 most significant
    pub fn new(words: [u32; 8]) -> Self {
        Self { words }
    }

    /// Create target from bytes (32 bytes, little-endian words)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::target(format!(
                "Invalid target length: expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut words = [0u32; 8];
        LittleEndian::read_u32_into(bytes, &mut words);
        Ok(Self::new(words))
    }

    /// Convert target to bytes (32 bytes, little-endian words)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; 32];
        LittleEndian::write_u32_into(&self.words, &mut bytes);
        bytes
    }

    /// Read a single target word
    pub fn word(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Convert to hexadecimal string (big-endian for display)
    pub fn to_hex_be(&self) -> String {
        format!(
            "{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}",
            self.words[7],
            self.words[6],
            self.words[5],
            self.words[4],
            self.words[3],
            self.words[2],
            self.words[1],
            self.words[0]
        )
    }

    /// Check whether a proof-of-work digest meets this target
    ///
    /// True when the digest, read as 8 little-endian words with word 7 most
    /// significant, is less than or equal to the target.
    pub fn meets(&self, hash: &[u8; 32]) -> bool {
        for i in (0..8).rev() {
            let hash_word = LittleEndian::read_u32(&hash[i * 4..]);
            if hash_word < self.words[i] {
                return true;
            } else if hash_word > self.words[i] {
                return false;
            }
        }
        true
    }

    /// Maximum possible target (easiest difficulty)
    pub fn max() -> Self {
        Self::new([u32::MAX; 8])
    }

    /// Minimum possible target (hardest difficulty)
    pub fn min() -> Self {
        Self::new([0; 8])
    }

    /// Get difficulty level (number of leading zero bits required)
    pub fn difficulty_level(&self) -> u32 {
        let mut zeros = 0;
        for i in (0..8).rev() {
            if self.words[i] == 0 {
                zeros += 32;
            } else {
                zeros += self.words[i].leading_zeros();
                break;
            }
        }
        zeros
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 64 {
            return Err(Error::target(format!(
                "Invalid target hex length: expected 64 chars, got {}",
                s.len()
            )));
        }

        // Parse as big-endian hex string
        let mut words = [0u32; 8];
        for i in 0..8 {
            let start = i * 8;
            let end = start + 8;
            words[7 - i] = u32::from_str_radix(&s[start..end], 16)
                .map_err(|e| Error::target(format!("Invalid hex in target: {}", e)))?;
        }

        Ok(Self::new(words))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_be())
    }
}

impl Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_be())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Target::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Proof-of-work nonce (4 bytes, header word 19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nonce(pub u32);

impl Nonce {
    /// Create a new nonce
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the nonce value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Convert to bytes (little-endian)
    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Create from bytes (little-endian)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 4 {
            return Err(Error::nonce(format!(
                "Invalid nonce length: expected 4 bytes, got {}",
                bytes.len()
            )));
        }
        let mut array = [0u8; 4];
        array.copy_from_slice(bytes);
        Ok(Self(u32::from_le_bytes(array)))
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
