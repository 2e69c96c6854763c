//! Append-only evidence ledger for blockwitness.
//!
//! This crate sits on top of `blockwitness-core`:
//! - **Ledger**: ordered blocks, append at the tail, inclusion proofs
//! - **Audit**: full-chain integrity scan reporting every problem
//! - **SharedLedger**: single-writer, many-reader handle
//! - **Views**: serializable projections for a serving layer
//!
//! # Example
//!
//! ```rust
//! use blockwitness_core::{hash, Blake3, Transaction};
//! use blockwitness_ledger::{Ledger, LedgerConfig};
//!
//! let mut ledger = Ledger::new(Blake3, LedgerConfig::default());
//! let tx = Transaction::new("photo.jpg", "alice", "report-1", hash(b"jpeg bytes"));
//! let leaf = tx.content_hash;
//! ledger.append(vec![tx]).unwrap();
//!
//! let view = ledger.proof_view(0, Some(leaf)).unwrap();
//! assert!(view.valid);
//! assert!(ledger.audit().ok);
//! ```

pub mod audit;
pub mod config;
pub mod ledger;
pub mod shared;
pub mod views;

// Re-export commonly used types
pub use audit::{audit_blocks, AuditReport, Problem, ProblemKind};
pub use config::{LedgerConfig, DEFAULT_MAX_BLOCK_SIZE};
pub use ledger::{Ledger, LedgerError, Result};
pub use shared::SharedLedger;
pub use views::{
    BlockDetail, BlockReceipt, BlockSummary, LeafLocation, ProofView, TimelineEntry,
    TransactionSummary, TransactionView,
};
