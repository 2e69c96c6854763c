//! Locate evidence command.

use super::{print_json, short};
use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use blockwitness_core::{Hash, Hasher};
use blockwitness_ledger::LeafLocation;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct LocateArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Evidence file to look up
    #[arg(conflicts_with = "hash", required_unless_present = "hash")]
    file: Option<PathBuf>,

    /// Content digest (hex) to look up
    #[arg(long)]
    hash: Option<String>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Located {
    #[serde(flatten)]
    location: LeafLocation,
    proof_valid: bool,
}

pub fn run(args: LocateArgs) -> Result<()> {
    let workspace = Workspace::open(&args.data_dir)?;
    let ledger = workspace.ledger()?;

    let leaf = match (args.hash, args.file) {
        (Some(hex), _) => {
            Hash::from_hex(&hex).with_context(|| format!("Invalid content digest: {}", hex))?
        }
        (None, Some(path)) => {
            let bytes =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            ledger.hasher().hash(&bytes)
        }
        (None, None) => bail!("Provide a file or --hash"),
    };

    let found = ledger
        .locate(&leaf)
        .into_iter()
        .map(|location| {
            let proof_valid = ledger.proof_view(location.block_idx, Some(leaf))?.valid;
            Ok(Located {
                location,
                proof_valid,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        return print_json(&found);
    }

    println!();
    println!("  Digest: {}", leaf.to_hex().bright_yellow());
    println!();

    if found.is_empty() {
        println!("  {}", "Not recorded in any block".bright_black());
        println!();
        return Ok(());
    }

    for entry in &found {
        let verdict = if entry.proof_valid {
            "proof ok".green()
        } else {
            "proof FAILED".red().bold()
        };
        println!(
            "  {} {} {} {}",
            format!("#{}", entry.location.block_idx).bright_black(),
            format!("leaf {}", entry.location.position).bright_cyan(),
            short(&entry.location.block_hash, 16).bright_yellow(),
            verdict
        );
        println!(
            "     {} {}",
            entry.location.tx_id.bright_black(),
            entry.location.report_id.bright_black()
        );
    }
    println!();

    Ok(())
}
