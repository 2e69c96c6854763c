//! Core primitives for the blockwitness evidence ledger.
//!
//! This crate provides the pure building blocks:
//! - A pluggable 256-bit hash primitive
//! - Merkle trees, inclusion proofs and proof verification
//! - Evidence transactions and reports
//! - Blocks and block verification
//!
//! Nothing here performs I/O.

pub mod block;
pub mod hash;
pub mod merkle;
pub mod report;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{
    current_timestamp, header_hash, Block, BlockError, BlockVerification, GENESIS_PREVIOUS_HASH,
};
pub use hash::{hash, hash_concat, Blake3, Hash, HashAlgorithm, Hasher, Sha256Hasher, H256};
pub use merkle::{
    merkle_proof, merkle_root, verify, verify_encoded, EncodedProofStep, MerkleError, MerkleProof,
    MerkleTree, Position, ProofStep,
};
pub use report::{EvidenceItem, EvidenceReport, ReportError};
pub use transaction::{generate_id, generate_tx_id, Transaction};
