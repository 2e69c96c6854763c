//! Digest type and the pluggable hash primitive.
//!
//! Every tree and chain computation goes through a [`Hasher`], so the digest
//! algorithm can be swapped without touching merkle or block logic.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters, for compact listings.
    pub fn short_hex(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }

    /// Parse from a hex string. A leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", self.short_hex(8))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for H256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A deterministic 256-bit digest function.
///
/// Implementors only provide [`Hasher::hash_concat`]; the other methods are
/// defined in terms of it, so `hash_pair(a, b) == hash(a || b)` holds for
/// every implementation.
pub trait Hasher {
    /// Hash the concatenation of `parts` in order.
    fn hash_concat(&self, parts: &[&[u8]]) -> Hash;

    /// Hash a single byte string.
    fn hash(&self, data: &[u8]) -> Hash {
        self.hash_concat(&[data])
    }

    /// Hash two digests as `left || right` over their raw bytes.
    fn hash_pair(&self, left: &Hash, right: &Hash) -> Hash {
        self.hash_concat(&[left.as_ref(), right.as_ref()])
    }
}

impl<H: Hasher + ?Sized> Hasher for &H {
    fn hash_concat(&self, parts: &[&[u8]]) -> Hash {
        (**self).hash_concat(parts)
    }
}

/// BLAKE3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl Hasher for Blake3 {
    fn hash_concat(&self, parts: &[&[u8]]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(hasher.finalize().into())
    }
}

/// SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash_concat(&self, parts: &[&[u8]]) -> Hash {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(hasher.finalize().into())
    }
}

/// Runtime-selectable digest algorithm, as stored in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

impl Hasher for HashAlgorithm {
    fn hash_concat(&self, parts: &[&[u8]]) -> Hash {
        match self {
            HashAlgorithm::Blake3 => Blake3.hash_concat(parts),
            HashAlgorithm::Sha256 => Sha256Hasher.hash_concat(parts),
        }
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Hash {
    Blake3.hash(data)
}

/// Hash multiple pieces of data by concatenating them, using Blake3.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    Blake3.hash_concat(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        let h1 = hash(data);
        let h2 = hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let h1 = hash(b"hello");
        let h2 = hash(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(b"test data");
        let parsed = Hash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);

        let prefixed: Hash = format!("0x{}", h.to_hex()).parse().unwrap();
        assert_eq!(h, prefixed);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("zz").is_err());
    }

    #[test]
    fn test_hash_display() {
        let h = hash(b"test");
        let display = format!("{}", h);
        assert_eq!(display.len(), 64);
        assert_eq!(h.short_hex(16).len(), 16);
    }

    #[test]
    fn test_hash_pair_is_raw_concat() {
        let a = hash(b"a");
        let b = hash(b"b");
        let mut joined = a.0.to_vec();
        joined.extend_from_slice(&b.0);

        assert_eq!(Blake3.hash_pair(&a, &b), Blake3.hash(&joined));
        assert_eq!(Sha256Hasher.hash_pair(&a, &b), Sha256Hasher.hash(&joined));
        assert_ne!(Blake3.hash_pair(&a, &b), Blake3.hash_pair(&b, &a));
    }

    #[test]
    fn test_sha256_known_vector() {
        let h = Sha256Hasher.hash(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_algorithm_dispatch() {
        assert_eq!(HashAlgorithm::Blake3.hash(b"x"), Blake3.hash(b"x"));
        assert_eq!(HashAlgorithm::Sha256.hash(b"x"), Sha256Hasher.hash(b"x"));
        assert_ne!(HashAlgorithm::Blake3.hash(b"x"), HashAlgorithm::Sha256.hash(b"x"));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("SHA256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha256));
        assert_eq!("blake3".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Blake3));
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_zero_hash() {
        assert_eq!(Hash::ZERO.0, [0u8; 32]);
    }
}
