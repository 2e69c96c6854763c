//! On-disk configuration (`<data-dir>/config.json`).

use anyhow::{Context, Result};
use blockwitness_core::HashAlgorithm;
use blockwitness_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest used for evidence, merkle nodes and block hashes.
    pub hash: HashAlgorithm,
    #[serde(flatten)]
    pub ledger: LedgerConfig,
}

impl Config {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    pub fn exists(data_dir: &Path) -> bool {
        Self::path(data_dir).exists()
    }

    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        let contents = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read {}. Did you run 'blockwitness init'?",
                path.display()
            )
        })?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
