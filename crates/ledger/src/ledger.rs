//! The append-only evidence ledger.
//!
//! A [`Ledger`] owns its blocks and has one mutating operation, appending at
//! the tail. Everything else is a read over committed, immutable blocks.

use crate::audit::{audit_blocks, AuditReport, Problem};
use crate::config::LedgerConfig;
use crate::views::{BlockDetail, BlockSummary, LeafLocation, ProofView, TimelineEntry};
use blockwitness_core::{
    current_timestamp, Block, BlockError, EncodedProofStep, Hash, HashAlgorithm, Hasher,
    MerkleError, MerkleProof, MerkleTree, Transaction, GENESIS_PREVIOUS_HASH,
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("block error: {0}")]
    Block(#[from] BlockError),

    #[error("merkle error: {0}")]
    Merkle(#[from] MerkleError),

    #[error("out of order append: expected block {expected}, got {got}")]
    OutOfOrderAppend { expected: u64, got: u64 },

    #[error("block not found: {0}")]
    BlockNotFound(u64),

    #[error("leaf {leaf} not found in block {block_idx}")]
    LeafNotFound { block_idx: u64, leaf: Hash },

    #[error("block has {count} transactions, limit is {max}")]
    BlockTooLarge { count: usize, max: usize },

    #[error("duplicate transaction id: {0}")]
    DuplicateTransaction(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ordered, append-only sequence of blocks.
#[derive(Debug, Clone)]
pub struct Ledger<H = HashAlgorithm> {
    hasher: H,
    config: LedgerConfig,
    blocks: Vec<Arc<Block>>,
    tx_ids: HashSet<String>,
}

impl<H: Hasher> Ledger<H> {
    /// Create an empty ledger.
    pub fn new(hasher: H, config: LedgerConfig) -> Self {
        Self {
            hasher,
            config,
            blocks: Vec::new(),
            tx_ids: HashSet::new(),
        }
    }

    /// Rebuild a ledger from persisted blocks, in index order.
    ///
    /// Only the index sequence is enforced; hashes are left for
    /// [`Ledger::audit`] to judge.
    pub fn restore<I>(hasher: H, config: LedgerConfig, blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Block>,
    {
        let mut ledger = Self::new(hasher, config);
        for block in blocks {
            ledger.append_block(block)?;
        }
        info!(blocks = ledger.len(), "restored ledger");
        Ok(ledger)
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Committed blocks in index order.
    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    /// Get a block by index.
    pub fn get(&self, idx: u64) -> Option<&Arc<Block>> {
        usize::try_from(idx).ok().and_then(|i| self.blocks.get(i))
    }

    /// Get a block by index, failing if it does not exist.
    pub fn block(&self, idx: u64) -> Result<&Arc<Block>> {
        self.get(idx).ok_or(LedgerError::BlockNotFound(idx))
    }

    /// Get the latest block.
    pub fn tail(&self) -> Option<&Arc<Block>> {
        self.blocks.last()
    }

    /// Index and `previous_hash` the next block must carry.
    pub fn next_link(&self) -> (u64, Hash) {
        let previous_hash = self
            .tail()
            .map(|b| b.block_hash)
            .unwrap_or(GENESIS_PREVIOUS_HASH);
        (self.blocks.len() as u64, previous_hash)
    }

    /// Check a transaction batch against the size limit and known ids.
    pub fn check_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        if transactions.len() > self.config.max_block_size {
            return Err(LedgerError::BlockTooLarge {
                count: transactions.len(),
                max: self.config.max_block_size,
            });
        }

        let mut seen = HashSet::with_capacity(transactions.len());
        for tx in transactions {
            if self.tx_ids.contains(&tx.tx_id) || !seen.insert(tx.tx_id.as_str()) {
                return Err(LedgerError::DuplicateTransaction(tx.tx_id.clone()));
            }
        }
        Ok(())
    }

    /// Build, without committing, the block that would be appended next.
    pub fn next_block(&self, transactions: Vec<Transaction>, timestamp: u64) -> Result<Block> {
        self.check_transactions(&transactions)?;
        let (idx, previous_hash) = self.next_link();
        Ok(Block::make(
            &self.hasher,
            idx,
            timestamp,
            previous_hash,
            transactions,
        )?)
    }

    /// Append a block of `transactions` stamped with the current time.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<Arc<Block>> {
        self.append_at(transactions, current_timestamp())
    }

    /// Append a block of `transactions` with an explicit timestamp.
    pub fn append_at(
        &mut self,
        transactions: Vec<Transaction>,
        timestamp: u64,
    ) -> Result<Arc<Block>> {
        let block = self.next_block(transactions, timestamp)?;
        self.append_block(block)
    }

    /// Commit an already constructed block at the tail.
    ///
    /// Fails with [`LedgerError::OutOfOrderAppend`] when `block.idx` is not
    /// the next index.
    pub fn append_block(&mut self, block: Block) -> Result<Arc<Block>> {
        let expected = self.blocks.len() as u64;
        if block.idx != expected {
            return Err(LedgerError::OutOfOrderAppend {
                expected,
                got: block.idx,
            });
        }

        for tx in &block.transactions {
            self.tx_ids.insert(tx.tx_id.clone());
        }

        debug!(
            idx = block.idx,
            txs = block.tx_count(),
            hash = %block.block_hash,
            "appended block"
        );

        let block = Arc::new(block);
        self.blocks.push(Arc::clone(&block));
        Ok(block)
    }

    /// Inclusion proof for the first transaction of block `block_idx` whose
    /// `content_hash` equals `leaf`.
    pub fn proof_for_leaf(&self, block_idx: u64, leaf: &Hash) -> Result<MerkleProof> {
        let (tree, index) = self.locate_in_block(block_idx, leaf)?;
        Ok(tree.proof(index)?)
    }

    /// Proof and verdict for `leaf` in block `block_idx`.
    ///
    /// Without a leaf the block's last transaction is proven. The verdict is
    /// computed against the block's stored merkle root.
    pub fn proof_view(&self, block_idx: u64, leaf: Option<Hash>) -> Result<ProofView> {
        let block = self.block(block_idx)?;
        let leaf = match leaf {
            Some(leaf) => leaf,
            None => block
                .transactions
                .last()
                .map(Transaction::leaf)
                .ok_or(MerkleError::EmptyTree)?,
        };

        let (tree, index) = self.locate_in_block(block_idx, &leaf)?;
        let proof = tree.proof(index)?;
        let computed_root = proof.compute_root(&self.hasher, &leaf);

        Ok(ProofView {
            block_idx,
            leaf: leaf.to_hex(),
            root: block.merkle_root.to_hex(),
            proof: proof.encode(),
            valid: computed_root == block.merkle_root,
            computed_root: computed_root.to_hex(),
            all_leaves: tree.leaves().iter().map(Hash::to_hex).collect(),
        })
    }

    /// Check a wire-form proof for `leaf` against block `block_idx`'s stored root.
    pub fn verify_encoded_proof(
        &self,
        block_idx: u64,
        leaf: &Hash,
        steps: &[EncodedProofStep],
    ) -> Result<bool> {
        let block = self.block(block_idx)?;
        Ok(blockwitness_core::verify_encoded(
            &self.hasher,
            leaf,
            steps,
            &block.merkle_root,
        )?)
    }

    fn locate_in_block(&self, block_idx: u64, leaf: &Hash) -> Result<(MerkleTree, usize)> {
        let block = self.block(block_idx)?;
        let tree = block.merkle_tree(&self.hasher)?;
        let index = tree.position(leaf).ok_or(LedgerError::LeafNotFound {
            block_idx,
            leaf: *leaf,
        })?;
        Ok((tree, index))
    }

    /// Every transaction in the chain whose `content_hash` equals `leaf`.
    pub fn locate(&self, leaf: &Hash) -> Vec<LeafLocation> {
        self.blocks
            .iter()
            .flat_map(|block| {
                block
                    .transactions
                    .iter()
                    .enumerate()
                    .filter(|(_, tx)| tx.content_hash == *leaf)
                    .map(move |(position, tx)| LeafLocation {
                        block_idx: block.idx,
                        position,
                        tx_id: tx.tx_id.clone(),
                        report_id: tx.report_id.clone(),
                        block_hash: block.block_hash.to_hex(),
                        merkle_root: block.merkle_root.to_hex(),
                    })
            })
            .collect()
    }

    /// Full-chain scan returning every problem found.
    pub fn audit_chain(&self) -> Vec<Problem> {
        audit_blocks(&self.hasher, self.blocks.iter().map(|b| b.as_ref()))
    }

    /// [`Ledger::audit_chain`] wrapped with an overall verdict.
    pub fn audit(&self) -> AuditReport {
        let problems = self.audit_chain();
        for problem in &problems {
            warn!(
                block = problem.block_idx,
                kind = %problem.kind,
                "{}",
                problem.detail
            );
        }
        let report = AuditReport::new(self.blocks.len(), problems);
        info!(
            blocks = report.blocks_checked,
            problems = report.problems.len(),
            ok = report.ok,
            "chain audit finished"
        );
        report
    }

    /// Block list, newest first, at most `limit` entries.
    pub fn summaries(&self, limit: usize) -> Vec<BlockSummary> {
        self.blocks
            .iter()
            .rev()
            .take(limit)
            .map(|b| BlockSummary::from(b.as_ref()))
            .collect()
    }

    /// Full detail of one block.
    pub fn detail(&self, idx: u64) -> Result<BlockDetail> {
        Ok(BlockDetail::from(self.block(idx)?.as_ref()))
    }

    /// All blocks newest first with their transaction summaries.
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        self.blocks
            .iter()
            .rev()
            .map(|b| TimelineEntry::from(b.as_ref()))
            .collect()
    }
}
