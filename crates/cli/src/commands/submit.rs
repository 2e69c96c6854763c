//! Submit evidence command.

use super::{format_timestamp, print_json, short};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use blockwitness_core::{EvidenceItem, EvidenceReport};
use blockwitness_ledger::BlockReceipt;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct SubmitArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Report title
    #[arg(short, long, default_value = "Untitled")]
    title: String,

    /// Who is submitting the evidence
    #[arg(short, long, default_value = "anonymous")]
    uploader: String,

    /// Free-form description
    #[arg(long, default_value = "")]
    description: String,

    /// Where the evidence was collected
    #[arg(long, default_value = "")]
    location: String,

    /// When the evidence was collected
    #[arg(long, default_value = "")]
    time: String,

    /// Print the receipt as JSON
    #[arg(long)]
    json: bool,

    /// Evidence files
    files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct SubmitReceipt {
    report_id: String,
    tx_ids: Vec<String>,
    manifest_hash: String,
    /// Canonical manifest JSON; hashing it yields `manifest_hash`.
    manifest: String,
    block: BlockReceipt,
}

pub fn run(args: SubmitArgs) -> Result<()> {
    let workspace = Workspace::open(&args.data_dir)?;
    let hasher = workspace.hasher();
    let mut ledger = workspace.ledger()?;

    let mut report = EvidenceReport::new(args.title, args.uploader)
        .with_description(args.description)
        .with_location(args.location)
        .with_time(args.time);

    for path in &args.files {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read evidence file: {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        report.add_evidence(EvidenceItem::from_bytes(&hasher, filename, &bytes));
    }

    let transactions = report.into_transactions(&hasher)?;
    let manifest_hash = report.manifest_hash(&hasher)?;
    let manifest = String::from_utf8(report.manifest_bytes()?)?;
    let block = ledger
        .append(transactions)
        .context("Failed to create block")?;
    workspace.persist(&block)?;
    workspace.persist_report(&report)?;

    info!(report = %report.report_id, block = block.idx, "submitted report");

    let receipt = SubmitReceipt {
        report_id: report.report_id.clone(),
        tx_ids: block.transactions.iter().map(|tx| tx.tx_id.clone()).collect(),
        manifest_hash: manifest_hash.to_hex(),
        manifest,
        block: BlockReceipt::from(block.as_ref()),
    };

    if args.json {
        return print_json(&receipt);
    }

    println!();
    println!("{}  Report recorded", "✓".green().bold());
    println!("    Report ID:  {}", receipt.report_id.bright_yellow());
    println!("    Block:      {}", block.idx.to_string().bright_cyan());
    println!("    Block Hash: {}", block.block_hash.to_hex().bright_yellow());
    println!("    Root:       {}", block.merkle_root.to_hex().bright_black());
    println!("    Time:       {}", format_timestamp(block.timestamp).bright_black());
    println!();
    for (item, tx) in report.evidence.iter().zip(&block.transactions) {
        println!(
            "  {} {} {}",
            tx.tx_id.bright_black(),
            item.content_hash.short_hex(16).bright_yellow(),
            item.filename
        );
    }
    println!(
        "  {} {} {}",
        receipt.tx_ids.last().map(String::as_str).unwrap_or("").bright_black(),
        short(&receipt.manifest_hash, 16).bright_yellow(),
        "(manifest)".bright_black()
    );
    println!();

    Ok(())
}
