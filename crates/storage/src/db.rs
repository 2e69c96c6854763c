//! sled database wrapper with bincode-encoded values.

use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Key prefix of block records.
pub const BLOCK_PREFIX: &[u8] = b"block:";

/// Key prefix of evidence report records.
pub const REPORT_PREFIX: &[u8] = b"report:";

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Out of order block: expected index {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Embedded key-value store. Values are bincode encoded; nothing is ever
/// removed.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Encode and store `value` under `key`.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        self.db.insert(key.as_ref(), bincode::serialize(value)?)?;
        Ok(())
    }

    /// Load and decode the value under `key`.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        self.db
            .get(key)?
            .map(|bytes| bincode::deserialize(&bytes).map_err(StorageError::from))
            .transpose()
    }

    /// Decode every value whose key starts with `prefix`, in key order.
    pub fn scan_prefix<V>(&self, prefix: &[u8]) -> impl Iterator<Item = Result<V>> + '_
    where
        V: serde::de::DeserializeOwned,
    {
        self.db.scan_prefix(prefix).map(|entry| {
            let (_, bytes) = entry?;
            Ok(bincode::deserialize(&bytes)?)
        })
    }

    /// Write several entries atomically: either all land or none does.
    pub fn batch(&self, operations: Vec<BatchOp>) -> Result<()> {
        let mut batch = sled::Batch::default();
        for op in operations {
            match op {
                BatchOp::Insert { key, value } => batch.insert(key, value),
            }
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// `block:{idx:020}`, zero padded so keys sort by index.
    pub fn block_key(idx: u64) -> Vec<u8> {
        let mut key = BLOCK_PREFIX.to_vec();
        key.extend_from_slice(format!("{:020}", idx).as_bytes());
        key
    }

    /// `report:{report_id}`.
    pub fn report_key(report_id: &str) -> Vec<u8> {
        let mut key = REPORT_PREFIX.to_vec();
        key.extend_from_slice(report_id.as_bytes());
        key
    }
}

/// One entry of an atomic batch.
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
}

impl BatchOp {
    /// Encode `value` into an insert operation.
    pub fn insert<V: serde::Serialize>(key: impl Into<Vec<u8>>, value: &V) -> Result<Self> {
        Ok(BatchOp::Insert {
            key: key.into(),
            value: bincode::serialize(value)?,
        })
    }
}
