//! Full-chain integrity audit.
//!
//! The audit never stops at the first finding and never fails: tampering is
//! reported as [`Problem`] entries.

use blockwitness_core::{Block, Hash, Hasher, GENESIS_PREVIOUS_HASH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an integrity finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemKind {
    /// `previous_hash` does not match the prior block (or the genesis sentinel).
    BrokenLink,
    /// Stored merkle root differs from the root over the transactions.
    MerkleMismatch,
    /// Stored block hash differs from the hash over the header.
    HashMismatch,
    /// Block index is not the expected position in the chain.
    IndexMismatch,
    /// Timestamp earlier than the previous block's. Informational.
    TimestampRegression,
}

impl ProblemKind {
    /// Whether this finding means the chain cannot be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProblemKind::TimestampRegression)
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProblemKind::BrokenLink => "BrokenLink",
            ProblemKind::MerkleMismatch => "MerkleMismatch",
            ProblemKind::HashMismatch => "HashMismatch",
            ProblemKind::IndexMismatch => "IndexMismatch",
            ProblemKind::TimestampRegression => "TimestampRegression",
        };
        f.write_str(name)
    }
}

/// One integrity finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub block_idx: u64,
    pub kind: ProblemKind,
    pub detail: String,
}

impl Problem {
    fn new(block_idx: u64, kind: ProblemKind, detail: String) -> Self {
        Self {
            block_idx,
            kind,
            detail,
        }
    }
}

/// Audit outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// True when no fatal problem was found.
    pub ok: bool,
    pub blocks_checked: usize,
    pub problems: Vec<Problem>,
}

impl AuditReport {
    pub fn new(blocks_checked: usize, problems: Vec<Problem>) -> Self {
        let ok = problems.iter().all(|p| !p.kind.is_fatal());
        Self {
            ok,
            blocks_checked,
            problems,
        }
    }

    /// Problems of one kind.
    pub fn of_kind(&self, kind: ProblemKind) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(move |p| p.kind == kind)
    }

    /// Problems reported for one block.
    pub fn for_block(&self, block_idx: u64) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(move |p| p.block_idx == block_idx)
    }
}

/// Scan `blocks` in order and report every integrity problem found.
///
/// Linkage is checked against both the prior block's recomputed hash and its
/// stored hash, so corrupting either the header fields or the stored hash of
/// block `k` shows up as a `BrokenLink` at `k + 1`.
pub fn audit_blocks<'a, H, I>(hasher: &H, blocks: I) -> Vec<Problem>
where
    H: Hasher,
    I: IntoIterator<Item = &'a Block>,
{
    let mut problems = Vec::new();
    let mut prev: Option<(&Block, Hash)> = None;

    for (position, block) in blocks.into_iter().enumerate() {
        let idx = block.idx;

        if idx != position as u64 {
            problems.push(Problem::new(
                idx,
                ProblemKind::IndexMismatch,
                format!("block at position {} carries index {}", position, idx),
            ));
        }

        let verification = block.verify(hasher);
        if !verification.merkle_ok {
            let recomputed = block
                .merkle_tree(hasher)
                .map(|tree| tree.root().to_hex())
                .unwrap_or_else(|_| "<no transactions>".to_string());
            problems.push(Problem::new(
                idx,
                ProblemKind::MerkleMismatch,
                format!(
                    "stored merkle root {} but transactions hash to {}",
                    block.merkle_root, recomputed
                ),
            ));
        }

        let recomputed_hash = block.compute_hash(hasher);
        if !verification.hash_ok {
            problems.push(Problem::new(
                idx,
                ProblemKind::HashMismatch,
                format!(
                    "stored block hash {} but header hashes to {}",
                    block.block_hash, recomputed_hash
                ),
            ));
        }

        match prev {
            None => {
                if block.previous_hash != GENESIS_PREVIOUS_HASH {
                    problems.push(Problem::new(
                        idx,
                        ProblemKind::BrokenLink,
                        format!(
                            "first block links to {} instead of the genesis sentinel",
                            block.previous_hash
                        ),
                    ));
                }
            }
            Some((parent, parent_recomputed)) => {
                if block.previous_hash != parent_recomputed
                    || block.previous_hash != parent.block_hash
                {
                    problems.push(Problem::new(
                        idx,
                        ProblemKind::BrokenLink,
                        format!(
                            "previous hash {} does not match block {} (stored {}, recomputed {})",
                            block.previous_hash, parent.idx, parent.block_hash, parent_recomputed
                        ),
                    ));
                }
                if block.timestamp < parent.timestamp {
                    problems.push(Problem::new(
                        idx,
                        ProblemKind::TimestampRegression,
                        format!(
                            "timestamp {} is earlier than block {} ({})",
                            block.timestamp, parent.idx, parent.timestamp
                        ),
                    ));
                }
            }
        }

        prev = Some((block, recomputed_hash));
    }

    problems
}
