//! Block persistence.

use crate::db::{BatchOp, Result, Storage, StorageError, BLOCK_PREFIX};
use blockwitness_core::Block;
use tracing::debug;

/// Number of persisted blocks.
const CHAIN_LENGTH_KEY: &[u8] = b"chain:length";

/// Stores blocks by index, append-only.
pub struct ChainStore<'a> {
    storage: &'a Storage,
}

impl<'a> ChainStore<'a> {
    /// Create a new ChainStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Number of persisted blocks. Returns 0 for a fresh database.
    pub fn len(&self) -> Result<u64> {
        Ok(self.storage.get::<_, u64>(CHAIN_LENGTH_KEY)?.unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Persist the next block.
    ///
    /// The block and the new length are written in one batch. Fails with
    /// [`StorageError::OutOfOrder`] unless `block.idx` equals the current length.
    pub fn put_block(&self, block: &Block) -> Result<()> {
        let expected = self.len()?;
        if block.idx != expected {
            return Err(StorageError::OutOfOrder {
                expected,
                got: block.idx,
            });
        }

        self.storage.batch(vec![
            BatchOp::insert(Storage::block_key(block.idx), block)?,
            BatchOp::insert(CHAIN_LENGTH_KEY, &(block.idx + 1))?,
        ])?;

        debug!(idx = block.idx, hash = %block.block_hash, "stored block");
        Ok(())
    }

    /// Every persisted block in index order.
    ///
    /// Fails with [`StorageError::NotFound`] if the recorded length and the
    /// stored block records disagree.
    pub fn load_blocks(&self) -> Result<Vec<Block>> {
        let len = self.len()?;
        let blocks = self
            .storage
            .scan_prefix::<Block>(BLOCK_PREFIX)
            .collect::<Result<Vec<_>>>()?;

        if blocks.len() as u64 != len {
            return Err(StorageError::NotFound(format!(
                "expected {} blocks, found {}",
                len,
                blocks.len()
            )));
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwitness_core::{hash, Blake3, Transaction, GENESIS_PREVIOUS_HASH};

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn block(idx: u64, prev: &Option<Block>) -> Block {
        let previous_hash = prev
            .as_ref()
            .map(|b| b.block_hash)
            .unwrap_or(GENESIS_PREVIOUS_HASH);
        let tx = Transaction::with_id(
            format!("tx_{}", idx),
            "doc",
            "eve",
            "r",
            hash(&[idx as u8]),
        );
        Block::make(&Blake3, idx, 1000 + idx, previous_hash, vec![tx]).unwrap()
    }

    fn chain(n: u64) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut prev = None;
        for idx in 0..n {
            let b = block(idx, &prev);
            prev = Some(b.clone());
            blocks.push(b);
        }
        blocks
    }

    #[test]
    fn test_empty_store() {
        let storage = setup();
        let chain = ChainStore::new(&storage);

        assert!(chain.is_empty().unwrap());
        assert!(chain.load_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_put_block_advances_length() {
        let storage = setup();
        let store = ChainStore::new(&storage);

        for b in &chain(3) {
            store.put_block(b).unwrap();
        }

        assert_eq!(store.len().unwrap(), 3);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn test_put_out_of_order_fails() {
        let storage = setup();
        let store = ChainStore::new(&storage);
        let blocks = chain(2);

        let result = store.put_block(&blocks[1]);
        assert!(matches!(
            result,
            Err(StorageError::OutOfOrder { expected: 0, got: 1 })
        ));

        store.put_block(&blocks[0]).unwrap();
        assert!(matches!(
            store.put_block(&blocks[0]),
            Err(StorageError::OutOfOrder { expected: 1, got: 0 })
        ));
    }

    #[test]
    fn test_load_blocks_in_index_order() {
        let storage = setup();
        let store = ChainStore::new(&storage);
        let blocks = chain(12);

        for b in &blocks {
            store.put_block(b).unwrap();
        }

        let loaded = store.load_blocks().unwrap();
        assert_eq!(loaded, blocks);
    }

    #[test]
    fn test_corrupt_length_is_an_error() {
        let storage = setup();
        let store = ChainStore::new(&storage);
        for b in &chain(2) {
            store.put_block(b).unwrap();
        }
        storage.put(CHAIN_LENGTH_KEY, &u64::MAX).unwrap();

        assert!(matches!(store.load_blocks(), Err(StorageError::NotFound(_))));
    }
}
