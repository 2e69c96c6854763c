//! Evidence report persistence.
//!
//! The chain only commits the manifest digest of a report. The report
//! itself is kept here so the digest can be recomputed later.

use crate::db::{Result, Storage};
use blockwitness_core::EvidenceReport;
use tracing::debug;

pub struct ReportStore<'a> {
    storage: &'a Storage,
}

impl<'a> ReportStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Store a report under its id.
    pub fn put_report(&self, report: &EvidenceReport) -> Result<()> {
        self.storage.put(Storage::report_key(&report.report_id), report)?;
        debug!(report = %report.report_id, items = report.evidence.len(), "stored report");
        Ok(())
    }

    pub fn get_report(&self, report_id: &str) -> Result<Option<EvidenceReport>> {
        self.storage.get(Storage::report_key(report_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwitness_core::{Blake3, EvidenceItem};

    #[test]
    fn test_report_round_trips_with_manifest_hash() {
        let storage = Storage::open_temporary().unwrap();
        let store = ReportStore::new(&storage);

        let mut report = EvidenceReport::new("Broken window", "carol")
            .with_description("north side")
            .with_location("Depot 4")
            .with_time("2024-02-02T08:30");
        report.add_evidence(EvidenceItem::from_bytes(&Blake3, "w.jpg", b"pixels"));
        let committed = report.manifest_hash(&Blake3).unwrap();

        store.put_report(&report).unwrap();
        let loaded = store.get_report(&report.report_id).unwrap().unwrap();

        assert_eq!(loaded, report);
        assert_eq!(loaded.manifest_hash(&Blake3).unwrap(), committed);
    }

    #[test]
    fn test_missing_report() {
        let storage = Storage::open_temporary().unwrap();
        assert!(ReportStore::new(&storage).get_report("nope").unwrap().is_none());
    }
}
