//! Ledger configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on transactions per block.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1000;

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum transactions per block.
    pub max_block_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }
}

impl LedgerConfig {
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.max_block_size, DEFAULT_MAX_BLOCK_SIZE);
    }

    #[test]
    fn test_builder() {
        let config = LedgerConfig::default().with_max_block_size(3);
        assert_eq!(config.max_block_size, 3);
    }
}
