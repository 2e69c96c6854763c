//! An opened data directory: configuration, database and the restored ledger.

use crate::config::Config;
use anyhow::{Context, Result};
use blockwitness_core::{Block, EvidenceReport, HashAlgorithm};
use blockwitness_ledger::Ledger;
use blockwitness_storage::{ChainStore, ReportStore, Storage};
use std::path::{Path, PathBuf};

const DB_DIR: &str = "db";

pub struct Workspace {
    pub config: Config,
    storage: Storage,
}

impl Workspace {
    /// Location of the sled database inside a data directory.
    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join(DB_DIR)
    }

    /// Open an initialized data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let storage = Storage::open(Self::db_path(data_dir))
            .with_context(|| "Failed to open storage. Did you run 'blockwitness init'?")?;
        Ok(Self { config, storage })
    }

    pub fn hasher(&self) -> HashAlgorithm {
        self.config.hash
    }

    /// Replay every persisted block into a ledger.
    pub fn ledger(&self) -> Result<Ledger<HashAlgorithm>> {
        let blocks = ChainStore::new(&self.storage)
            .load_blocks()
            .context("Failed to load blocks")?;
        Ledger::restore(self.config.hash, self.config.ledger.clone(), blocks)
            .context("Stored blocks are out of order")
    }

    /// Persist a newly appended block.
    pub fn persist(&self, block: &Block) -> Result<()> {
        ChainStore::new(&self.storage)
            .put_block(block)
            .with_context(|| format!("Failed to store block {}", block.idx))?;
        self.storage.flush()?;
        Ok(())
    }

    /// Persist the report whose manifest a block commits to.
    pub fn persist_report(&self, report: &EvidenceReport) -> Result<()> {
        ReportStore::new(&self.storage)
            .put_report(report)
            .with_context(|| format!("Failed to store report {}", report.report_id))?;
        self.storage.flush()?;
        Ok(())
    }

    pub fn report(&self, report_id: &str) -> Result<EvidenceReport> {
        ReportStore::new(&self.storage)
            .get_report(report_id)
            .with_context(|| format!("Failed to load report {}", report_id))?
            .with_context(|| format!("Report not found: {}", report_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwitness_core::{hash, EvidenceItem, Transaction};

    #[test]
    fn test_blocks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        Config::default().save(dir.path()).unwrap();

        {
            let workspace = Workspace::open(dir.path()).unwrap();
            let mut ledger = workspace.ledger().unwrap();
            let tx = Transaction::new("doc", "ann", "r1", hash(b"doc"));
            let block = ledger.append(vec![tx]).unwrap();
            workspace.persist(&block).unwrap();
        }

        let workspace = Workspace::open(dir.path()).unwrap();
        let ledger = workspace.ledger().unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.audit().ok);
    }

    #[test]
    fn test_stored_report_matches_manifest_leaf() {
        let dir = tempfile::tempdir().unwrap();
        Config::default().save(dir.path()).unwrap();

        let report_id = {
            let workspace = Workspace::open(dir.path()).unwrap();
            let hasher = workspace.hasher();
            let mut ledger = workspace.ledger().unwrap();

            let mut report = EvidenceReport::new("Spill", "dana")
                .with_description("oil on the river")
                .with_location("Pier 9")
                .with_time("2024-06-01T07:00");
            report.add_evidence(EvidenceItem::from_bytes(&hasher, "spill.jpg", b"jpeg"));

            let block = ledger.append(report.into_transactions(&hasher).unwrap()).unwrap();
            workspace.persist(&block).unwrap();
            workspace.persist_report(&report).unwrap();
            report.report_id
        };

        let workspace = Workspace::open(dir.path()).unwrap();
        let ledger = workspace.ledger().unwrap();
        let report = workspace.report(&report_id).unwrap();
        assert_eq!(report.location, "Pier 9");

        let manifest_leaf = ledger.blocks()[0].transactions.last().unwrap().content_hash;
        assert_eq!(report.manifest_hash(&workspace.hasher()).unwrap(), manifest_leaf);
    }

    #[test]
    fn test_unknown_report() {
        let dir = tempfile::tempdir().unwrap();
        Config::default().save(dir.path()).unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();

        let err = workspace.report("missing").unwrap_err();
        assert!(err.to_string().contains("Report not found"));
    }

    #[test]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Workspace::open(dir.path()).is_err());
    }
}
