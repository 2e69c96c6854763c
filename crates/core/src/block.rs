//! Immutable blocks and their integrity checks.

use crate::hash::{Hash, Hasher};
use crate::merkle::{MerkleError, MerkleTree};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// `previous_hash` of block 0.
pub const GENESIS_PREVIOUS_HASH: Hash = Hash::ZERO;

/// Errors that can occur while constructing a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("a block must contain at least one transaction")]
    EmptyBlock,
    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// An append-only batch of evidence records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the ledger, starting at 0.
    pub idx: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Hash of the previous block, or [`GENESIS_PREVIOUS_HASH`].
    pub previous_hash: Hash,
    /// Records in leaf order. Never re-sorted.
    pub transactions: Vec<Transaction>,
    /// Merkle root over `transactions[i].content_hash`.
    pub merkle_root: Hash,
    /// Digest of the canonical header (see [`header_hash`]).
    pub block_hash: Hash,
}

/// Result of recomputing a block's derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockVerification {
    pub merkle_ok: bool,
    pub hash_ok: bool,
}

impl BlockVerification {
    pub fn is_valid(&self) -> bool {
        self.merkle_ok && self.hash_ok
    }
}

/// Hash of the canonical header encoding:
/// `idx (u64 BE) || timestamp (u64 BE) || previous_hash || merkle_root`.
pub fn header_hash<H: Hasher>(
    hasher: &H,
    idx: u64,
    timestamp: u64,
    previous_hash: &Hash,
    merkle_root: &Hash,
) -> Hash {
    hasher.hash_concat(&[
        &idx.to_be_bytes(),
        &timestamp.to_be_bytes(),
        previous_hash.as_ref(),
        merkle_root.as_ref(),
    ])
}

/// Current Unix timestamp in seconds. A clock before the epoch reads as 0.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Block {
    /// Build a block, deriving `merkle_root` and `block_hash`.
    pub fn make<H: Hasher>(
        hasher: &H,
        idx: u64,
        timestamp: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Result<Self, BlockError> {
        if transactions.is_empty() {
            return Err(BlockError::EmptyBlock);
        }
        let merkle_root = compute_merkle_root(hasher, &transactions)?;
        let block_hash = header_hash(hasher, idx, timestamp, &previous_hash, &merkle_root);

        Ok(Self {
            idx,
            timestamp,
            previous_hash,
            transactions,
            merkle_root,
            block_hash,
        })
    }

    /// Leaf digests in transaction order.
    pub fn leaves(&self) -> Vec<Hash> {
        self.transactions.iter().map(Transaction::leaf).collect()
    }

    /// Rebuild the merkle tree from the current transactions.
    pub fn merkle_tree<H: Hasher>(&self, hasher: &H) -> Result<MerkleTree, MerkleError> {
        MerkleTree::build(hasher, &self.leaves())
    }

    /// Recompute the block hash from the stored header fields.
    pub fn compute_hash<H: Hasher>(&self, hasher: &H) -> Hash {
        header_hash(
            hasher,
            self.idx,
            self.timestamp,
            &self.previous_hash,
            &self.merkle_root,
        )
    }

    /// Recompute both derived values and compare them with the stored ones.
    ///
    /// A block whose transaction list has been emptied reports
    /// `merkle_ok = false`.
    pub fn verify<H: Hasher>(&self, hasher: &H) -> BlockVerification {
        let merkle_ok = compute_merkle_root(hasher, &self.transactions)
            .map(|root| root == self.merkle_root)
            .unwrap_or(false);
        let hash_ok = self.compute_hash(hasher) == self.block_hash;

        BlockVerification { merkle_ok, hash_ok }
    }

    /// Check if this is the first block of a ledger.
    pub fn is_genesis(&self) -> bool {
        self.idx == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Index of the first transaction whose leaf equals `content_hash`.
    pub fn position_of(&self, content_hash: &Hash) -> Option<usize> {
        self.transactions
            .iter()
            .position(|tx| tx.content_hash == *content_hash)
    }
}

fn compute_merkle_root<H: Hasher>(
    hasher: &H,
    transactions: &[Transaction],
) -> Result<Hash, MerkleError> {
    let leaves: Vec<Hash> = transactions.iter().map(Transaction::leaf).collect();
    Ok(MerkleTree::build(hasher, &leaves)?.root())
}
