//! Evidence records included in blocks.

use crate::hash::Hash;
use serde::{Deserialize, Serialize};

/// Prefix of generated transaction ids.
pub const TX_ID_PREFIX: &str = "tx_";

/// One evidence record inside a block.
///
/// Only `content_hash` takes part in the merkle tree; the payload itself is
/// held by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub tx_id: String,
    /// Human readable title of the evidence.
    pub title: String,
    /// Who submitted it.
    pub uploader: String,
    /// Report this record belongs to.
    pub report_id: String,
    /// Digest of the evidence payload (the merkle leaf).
    pub content_hash: Hash,
}

impl Transaction {
    /// Create a transaction with a freshly generated id.
    pub fn new(
        title: impl Into<String>,
        uploader: impl Into<String>,
        report_id: impl Into<String>,
        content_hash: Hash,
    ) -> Self {
        Self::with_id(generate_tx_id(), title, uploader, report_id, content_hash)
    }

    /// Create a transaction with an explicit id (e.g. when loading records).
    pub fn with_id(
        tx_id: impl Into<String>,
        title: impl Into<String>,
        uploader: impl Into<String>,
        report_id: impl Into<String>,
        content_hash: Hash,
    ) -> Self {
        Self {
            tx_id: tx_id.into(),
            title: title.into(),
            uploader: uploader.into(),
            report_id: report_id.into(),
            content_hash,
        }
    }

    /// The merkle leaf for this record.
    pub fn leaf(&self) -> Hash {
        self.content_hash
    }
}

/// Random 128-bit identifier, hex encoded.
pub fn generate_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Random transaction id of the form `tx_<32 hex chars>`.
pub fn generate_tx_id() -> String {
    format!("{}{}", TX_ID_PREFIX, generate_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Transaction::new("photo", "alice", "r1", hash(b"a"));
        let b = Transaction::new("photo", "alice", "r1", hash(b"a"));
        assert_ne!(a.tx_id, b.tx_id);
        assert!(a.tx_id.starts_with(TX_ID_PREFIX));
        assert_eq!(a.tx_id.len(), TX_ID_PREFIX.len() + 32);
    }

    #[test]
    fn test_leaf_is_content_hash() {
        let tx = Transaction::with_id("tx_1", "doc", "bob", "r2", hash(b"payload"));
        assert_eq!(tx.leaf(), hash(b"payload"));
        assert_eq!(tx.tx_id, "tx_1");
    }

    #[test]
    fn test_serde_roundtrip() {
        let tx = Transaction::with_id("tx_9", "video", "carol", "r3", hash(b"v"));
        let json = serde_json::to_string(&tx).unwrap();
        let parsed: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tx);
    }
}
