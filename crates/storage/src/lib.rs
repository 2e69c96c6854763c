//! Persistent storage layer for blockwitness.
//!
//! Blocks are stored in an embedded sled database, keyed by zero-padded
//! index so a prefix scan returns them in chain order. Evidence reports are
//! kept next to them, keyed by report id. Storage never checks hashes;
//! loaded blocks are handed to the ledger, whose audit decides whether they
//! can be trusted.
//!
//! # Example
//!
//! ```rust,no_run
//! use blockwitness_storage::{ChainStore, Storage};
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//! let chain = ChainStore::new(&storage);
//! let blocks = chain.load_blocks().unwrap();
//! println!("{} blocks on disk", blocks.len());
//! ```

pub mod chain;
pub mod db;
pub mod report;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{BatchOp, Result, Storage, StorageError};
pub use report::ReportStore;
