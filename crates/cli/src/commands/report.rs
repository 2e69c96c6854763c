//! Stored evidence report command.

use super::{format_timestamp, print_json, short};
use crate::workspace::Workspace;
use anyhow::{bail, Result};
use blockwitness_core::EvidenceReport;
use blockwitness_ledger::{LeafLocation, Ledger};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Show a stored report and check that its manifest is on the chain
    Show {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Report id printed by `submit`
        report_id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct ItemCheck {
    filename: String,
    content_hash: String,
    size: u64,
    /// Whether a transaction of this report carries the digest.
    recorded: bool,
}

/// A stored report checked against the chain.
#[derive(Debug, Serialize)]
struct ReportCheck {
    report_id: String,
    title: String,
    uploader: String,
    description: String,
    location: String,
    time: String,
    evidence: Vec<ItemCheck>,
    /// Recomputed from the stored report.
    manifest_hash: String,
    manifest_locations: Vec<LeafLocation>,
    /// The manifest digest is committed and its inclusion proof holds.
    anchored: bool,
}

pub fn run(args: ReportArgs) -> Result<()> {
    match args.command {
        ReportCommand::Show {
            data_dir,
            report_id,
            json,
        } => show_report(data_dir, report_id, json),
    }
}

fn check_report(ledger: &Ledger, report: &EvidenceReport) -> Result<ReportCheck> {
    let own = |location: &LeafLocation| location.report_id == report.report_id;

    let manifest_hash = report.manifest_hash(ledger.hasher())?;
    let manifest_locations: Vec<LeafLocation> = ledger
        .locate(&manifest_hash)
        .into_iter()
        .filter(own)
        .collect();

    let mut anchored = !manifest_locations.is_empty();
    for location in &manifest_locations {
        anchored &= ledger.proof_view(location.block_idx, Some(manifest_hash))?.valid;
    }

    let evidence = report
        .evidence
        .iter()
        .map(|item| ItemCheck {
            filename: item.filename.clone(),
            content_hash: item.content_hash.to_hex(),
            size: item.size,
            recorded: ledger.locate(&item.content_hash).iter().any(own),
        })
        .collect();

    Ok(ReportCheck {
        report_id: report.report_id.clone(),
        title: report.title.clone(),
        uploader: report.uploader.clone(),
        description: report.description.clone(),
        location: report.location.clone(),
        time: report.time.clone(),
        evidence,
        manifest_hash: manifest_hash.to_hex(),
        manifest_locations,
        anchored,
    })
}

fn show_report(data_dir: PathBuf, report_id: String, json: bool) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;
    let report = workspace.report(&report_id)?;
    let check = check_report(&ledger, &report)?;

    if json {
        print_json(&check)?;
    } else {
        println!();
        println!("{}", "Evidence Report:".bold().cyan());
        println!();
        println!("  Report ID:   {}", check.report_id.bright_yellow());
        println!("  Title:       {}", check.title);
        println!("  Uploader:    {}", check.uploader);
        println!("  Description: {}", check.description);
        println!("  Location:    {}", check.location);
        println!("  Time:        {}", check.time);
        println!("  Manifest:    {}", check.manifest_hash.bright_black());
        println!();

        for item in &check.evidence {
            let mark = if item.recorded {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            println!(
                "  {} {} {} {}",
                mark,
                short(&item.content_hash, 16).bright_yellow(),
                item.filename,
                format!("({} bytes)", item.size).bright_black()
            );
        }
        for location in &check.manifest_locations {
            if let Some(block) = ledger.get(location.block_idx) {
                println!(
                    "  {} {} {}",
                    format!("#{}", location.block_idx).bright_black(),
                    short(&location.block_hash, 16).bright_yellow(),
                    format_timestamp(block.timestamp).bright_black()
                );
            }
        }
        println!();
    }

    if !check.anchored {
        bail!("Manifest of report {} is not anchored in the chain", report_id);
    }
    if !json {
        println!("{}  Report matches the chain", "✓".green().bold());
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwitness_core::{EvidenceItem, HashAlgorithm};
    use blockwitness_ledger::LedgerConfig;

    fn submitted() -> (Ledger, EvidenceReport) {
        let hasher = HashAlgorithm::Sha256;
        let mut report = EvidenceReport::new("Fallen tree", "erin").with_location("Elm Rd");
        report.add_evidence(EvidenceItem::from_bytes(&hasher, "tree.jpg", b"bark"));

        let mut ledger = Ledger::new(hasher, LedgerConfig::default());
        ledger.append_at(report.into_transactions(&hasher).unwrap(), 50).unwrap();
        (ledger, report)
    }

    #[test]
    fn test_stored_report_is_anchored() {
        let (ledger, report) = submitted();
        let check = check_report(&ledger, &report).unwrap();

        assert!(check.anchored);
        assert_eq!(check.manifest_locations.len(), 1);
        assert_eq!(check.manifest_locations[0].position, 1);
        assert!(check.evidence.iter().all(|item| item.recorded));
    }

    #[test]
    fn test_edited_report_is_not_anchored() {
        let (ledger, mut report) = submitted();
        report.location = "Oak Rd".into();
        let check = check_report(&ledger, &report).unwrap();

        assert!(!check.anchored);
        assert!(check.manifest_locations.is_empty());
        assert!(check.evidence[0].recorded);
    }
}
