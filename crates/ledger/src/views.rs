//! Read-only projections of the ledger handed to a serving layer.
//!
//! Digests are rendered as lowercase hex.

use blockwitness_core::{Block, EncodedProofStep, Transaction};
use serde::{Deserialize, Serialize};

/// Metadata returned after a block is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipt {
    pub idx: u64,
    pub block_hash: String,
    pub merkle_root: String,
    pub timestamp: u64,
}

impl From<&Block> for BlockReceipt {
    fn from(block: &Block) -> Self {
        Self {
            idx: block.idx,
            block_hash: block.block_hash.to_hex(),
            merkle_root: block.merkle_root.to_hex(),
            timestamp: block.timestamp,
        }
    }
}

/// One row of the block list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub idx: u64,
    pub timestamp: u64,
    pub block_hash: String,
    pub merkle_root: String,
    pub tx_count: usize,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            idx: block.idx,
            timestamp: block.timestamp,
            block_hash: block.block_hash.to_hex(),
            merkle_root: block.merkle_root.to_hex(),
            tx_count: block.tx_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub tx_id: String,
    pub title: String,
    pub uploader: String,
    pub report_id: String,
    pub content_hash: String,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            tx_id: tx.tx_id.clone(),
            title: tx.title.clone(),
            uploader: tx.uploader.clone(),
            report_id: tx.report_id.clone(),
            content_hash: tx.content_hash.to_hex(),
        }
    }
}

/// A block with every transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetail {
    pub idx: u64,
    pub timestamp: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub block_hash: String,
    pub transactions: Vec<TransactionView>,
}

impl From<&Block> for BlockDetail {
    fn from(block: &Block) -> Self {
        Self {
            idx: block.idx,
            timestamp: block.timestamp,
            previous_hash: block.previous_hash.to_hex(),
            merkle_root: block.merkle_root.to_hex(),
            block_hash: block.block_hash.to_hex(),
            transactions: block.transactions.iter().map(TransactionView::from).collect(),
        }
    }
}

/// Inclusion proof with its verdict, as consumed by a proof visualizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofView {
    pub block_idx: u64,
    pub leaf: String,
    /// Stored merkle root of the block.
    pub root: String,
    pub proof: Vec<EncodedProofStep>,
    /// Whether `computed_root` equals `root`.
    pub valid: bool,
    /// Root obtained by folding `leaf` through `proof`.
    pub computed_root: String,
    pub all_leaves: Vec<String>,
}

/// Transaction fields shown on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub tx_id: String,
    pub title: String,
    pub uploader: String,
    pub report_id: String,
}

impl From<&Transaction> for TransactionSummary {
    fn from(tx: &Transaction) -> Self {
        Self {
            tx_id: tx.tx_id.clone(),
            title: tx.title.clone(),
            uploader: tx.uploader.clone(),
            report_id: tx.report_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub idx: u64,
    pub timestamp: u64,
    pub block_hash: String,
    pub merkle_root: String,
    pub transactions: Vec<TransactionSummary>,
}

impl From<&Block> for TimelineEntry {
    fn from(block: &Block) -> Self {
        Self {
            idx: block.idx,
            timestamp: block.timestamp,
            block_hash: block.block_hash.to_hex(),
            merkle_root: block.merkle_root.to_hex(),
            transactions: block
                .transactions
                .iter()
                .map(TransactionSummary::from)
                .collect(),
        }
    }
}

/// Where a content digest appears in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafLocation {
    pub block_idx: u64,
    pub position: usize,
    pub tx_id: String,
    pub report_id: String,
    pub block_hash: String,
    pub merkle_root: String,
}
