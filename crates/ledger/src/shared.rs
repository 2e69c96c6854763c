//! Thread-safe ledger handle with a single-writer discipline.
//!
//! Appends are serialized by a writer mutex. The next block is built while
//! only that mutex is held, then published under a short exclusive lock, so
//! readers see either the previous state or the committed block, never a
//! partially built one. Readers share the read lock and run in parallel.

use crate::audit::AuditReport;
use crate::ledger::{Ledger, LedgerError, Result};
use blockwitness_core::{current_timestamp, Block, Hash, Hasher, MerkleProof, Transaction};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub struct SharedLedger<H> {
    ledger: RwLock<Ledger<H>>,
    writer: Mutex<()>,
    hasher: H,
}

impl<H: Hasher + Clone> SharedLedger<H> {
    pub fn new(ledger: Ledger<H>) -> Self {
        let hasher = ledger.hasher().clone();
        Self {
            ledger: RwLock::new(ledger),
            writer: Mutex::new(()),
            hasher,
        }
    }

    /// Append a block stamped with the current time.
    pub fn append(&self, transactions: Vec<Transaction>) -> Result<Arc<Block>> {
        self.append_at(transactions, current_timestamp())
    }

    /// Append a block with an explicit timestamp.
    pub fn append_at(&self, transactions: Vec<Transaction>, timestamp: u64) -> Result<Arc<Block>> {
        let _writer = self.writer.lock();

        let (idx, previous_hash) = {
            let ledger = self.ledger.read();
            ledger.check_transactions(&transactions)?;
            ledger.next_link()
        };

        // Built off the shared structure; the tail cannot move while we hold
        // the writer mutex.
        let block = Block::make(&self.hasher, idx, timestamp, previous_hash, transactions)
            .map_err(LedgerError::from)?;

        self.ledger.write().append_block(block)
    }

    /// Run `f` against the committed state.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger<H>) -> R) -> R {
        f(&self.ledger.read())
    }

    /// The committed blocks at this instant.
    pub fn snapshot(&self) -> Vec<Arc<Block>> {
        self.ledger.read().blocks().to_vec()
    }

    pub fn len(&self) -> usize {
        self.ledger.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().is_empty()
    }

    pub fn proof_for_leaf(&self, block_idx: u64, leaf: &Hash) -> Result<MerkleProof> {
        self.ledger.read().proof_for_leaf(block_idx, leaf)
    }

    pub fn audit(&self) -> AuditReport {
        self.ledger.read().audit()
    }

    pub fn into_inner(self) -> Ledger<H> {
        self.ledger.into_inner()
    }
}
