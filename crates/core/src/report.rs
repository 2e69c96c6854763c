//! Evidence reports: a titled submission of one or more evidence files.
//!
//! A report becomes a run of transactions: one per evidence item, followed by
//! a manifest record whose leaf is the hash of the report's canonical JSON.

use crate::hash::{Hash, Hasher};
use crate::transaction::{generate_id, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode report manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// One uploaded evidence payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub filename: String,
    pub content_hash: Hash,
    pub size: u64,
}

impl EvidenceItem {
    /// Digest `bytes` with `hasher` and record it under `filename`.
    pub fn from_bytes<H: Hasher>(hasher: &H, filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content_hash: hasher.hash(bytes),
            size: bytes.len() as u64,
        }
    }
}

/// A submitted report and its evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceReport {
    pub report_id: String,
    pub title: String,
    pub uploader: String,
    pub description: String,
    pub location: String,
    pub time: String,
    pub evidence: Vec<EvidenceItem>,
}

// Field order here is the canonical manifest order.
#[derive(Serialize)]
struct Manifest<'a> {
    description: &'a str,
    evidence: Vec<ManifestItem<'a>>,
    location: &'a str,
    report_id: &'a str,
    time: &'a str,
    title: &'a str,
    uploader: &'a str,
}

#[derive(Serialize)]
struct ManifestItem<'a> {
    content_hash: String,
    filename: &'a str,
    size: u64,
}

impl EvidenceReport {
    /// Start a report with a generated id and no evidence.
    pub fn new(title: impl Into<String>, uploader: impl Into<String>) -> Self {
        Self {
            report_id: generate_id(),
            title: title.into(),
            uploader: uploader.into(),
            description: String::new(),
            location: String::new(),
            time: String::new(),
            evidence: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn add_evidence(&mut self, item: EvidenceItem) {
        self.evidence.push(item);
    }

    /// Canonical JSON of the report: keys sorted, digests as lowercase hex.
    pub fn manifest_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let manifest = Manifest {
            description: &self.description,
            evidence: self
                .evidence
                .iter()
                .map(|item| ManifestItem {
                    content_hash: item.content_hash.to_hex(),
                    filename: &item.filename,
                    size: item.size,
                })
                .collect(),
            location: &self.location,
            report_id: &self.report_id,
            time: &self.time,
            title: &self.title,
            uploader: &self.uploader,
        };
        Ok(serde_json::to_vec(&manifest)?)
    }

    /// Digest of [`EvidenceReport::manifest_bytes`].
    pub fn manifest_hash<H: Hasher>(&self, hasher: &H) -> Result<Hash, ReportError> {
        Ok(hasher.hash(&self.manifest_bytes()?))
    }

    /// Evidence records in upload order, then the manifest record.
    pub fn into_transactions<H: Hasher>(
        &self,
        hasher: &H,
    ) -> Result<Vec<Transaction>, ReportError> {
        let mut transactions: Vec<Transaction> = self
            .evidence
            .iter()
            .map(|item| {
                Transaction::new(
                    format!("{}: {}", self.title, item.filename),
                    self.uploader.clone(),
                    self.report_id.clone(),
                    item.content_hash,
                )
            })
            .collect();

        transactions.push(Transaction::new(
            self.title.clone(),
            self.uploader.clone(),
            self.report_id.clone(),
            self.manifest_hash(hasher)?,
        ));
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Blake3, Sha256Hasher};

    fn sample() -> EvidenceReport {
        let mut report = EvidenceReport::new("Flooded road", "alice")
            .with_description("water over the bridge")
            .with_location("Main St")
            .with_time("2024-05-01T10:00");
        report.add_evidence(EvidenceItem::from_bytes(&Blake3, "a.jpg", b"jpeg bytes"));
        report.add_evidence(EvidenceItem::from_bytes(&Blake3, "b.mp4", b"video bytes"));
        report
    }

    #[test]
    fn test_evidence_item_digest() {
        let item = EvidenceItem::from_bytes(&Sha256Hasher, "x.txt", b"abc");
        assert_eq!(item.size, 3);
        assert_eq!(item.content_hash, Sha256Hasher.hash(b"abc"));
    }

    #[test]
    fn test_manifest_is_canonical() {
        let report = sample();
        let bytes = report.manifest_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("{\"description\":"));
        assert!(text.contains(&report.evidence[0].content_hash.to_hex()));
        assert_eq!(
            report.manifest_hash(&Blake3).unwrap(),
            report.manifest_hash(&Blake3).unwrap()
        );
    }

    #[test]
    fn test_manifest_hash_changes_with_content() {
        let report = sample();
        let mut edited = report.clone();
        edited.description.push('!');
        assert_ne!(
            report.manifest_hash(&Blake3).unwrap(),
            edited.manifest_hash(&Blake3).unwrap()
        );
    }

    #[test]
    fn test_into_transactions_layout() {
        let report = sample();
        let txs = report.into_transactions(&Blake3).unwrap();

        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].content_hash, report.evidence[0].content_hash);
        assert_eq!(txs[1].content_hash, report.evidence[1].content_hash);
        assert_eq!(txs[2].content_hash, report.manifest_hash(&Blake3).unwrap());
        assert!(txs.iter().all(|tx| tx.report_id == report.report_id));
        assert_eq!(txs[2].title, "Flooded road");
    }

    #[test]
    fn test_report_without_evidence_still_has_manifest_leaf() {
        let report = EvidenceReport::new("Note", "bob");
        let txs = report.into_transactions(&Blake3).unwrap();
        assert_eq!(txs.len(), 1);
    }
}
