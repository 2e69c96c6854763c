//! Merkle inclusion proof command.

use super::{print_json, short};
use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use blockwitness_core::{EncodedProofStep, Hash, Hasher};
use blockwitness_ledger::ProofView;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ProofArgs {
    #[command(subcommand)]
    command: ProofCommand,
}

#[derive(Subcommand)]
enum ProofCommand {
    /// Produce an inclusion proof for a leaf of a block
    Show {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block index
        idx: u64,

        /// Leaf digest (hex). Defaults to the block's last transaction.
        #[arg(short, long, conflicts_with = "file")]
        leaf: Option<String>,

        /// Hash this file and prove its digest
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a saved proof against a block's stored merkle root
    Verify {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block index
        idx: u64,

        /// Leaf digest (hex). Taken from the proof file when it holds a full proof view.
        #[arg(short, long)]
        leaf: Option<String>,

        /// JSON file with a list of proof steps or the output of `proof show --json`
        #[arg(short, long)]
        proof_file: PathBuf,
    },
}

/// Accepted layouts of a proof file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProofFile {
    View(ProofView),
    Steps(Vec<EncodedProofStep>),
}

pub fn run(args: ProofArgs) -> Result<()> {
    match args.command {
        ProofCommand::Show {
            data_dir,
            idx,
            leaf,
            file,
            json,
        } => show_proof(data_dir, idx, leaf, file, json),
        ProofCommand::Verify {
            data_dir,
            idx,
            leaf,
            proof_file,
        } => verify_proof(data_dir, idx, leaf, proof_file),
    }
}

fn parse_leaf(hex: &str) -> Result<Hash> {
    Hash::from_hex(hex).with_context(|| format!("Invalid leaf digest: {}", hex))
}

fn hash_file<H: Hasher>(hasher: &H, path: &Path) -> Result<Hash> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hasher.hash(&bytes))
}

fn show_proof(
    data_dir: PathBuf,
    idx: u64,
    leaf: Option<String>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;

    let leaf = match (leaf, file) {
        (Some(hex), _) => Some(parse_leaf(&hex)?),
        (None, Some(path)) => Some(hash_file(ledger.hasher(), &path)?),
        (None, None) => None,
    };

    let view = ledger.proof_view(idx, leaf)?;

    if json {
        return print_json(&view);
    }

    println!();
    println!("{}", "Inclusion Proof:".bold().cyan());
    println!();
    println!("  Block:         {}", view.block_idx.to_string().bright_cyan());
    println!("  Leaf:          {}", view.leaf.bright_yellow());
    println!("  Merkle Root:   {}", view.root.bright_black());
    println!("  Computed Root: {}", view.computed_root.bright_black());
    println!();

    println!("{}", "Steps:".bold());
    println!();
    if view.proof.is_empty() {
        println!("  {}", "(single leaf, the leaf is the root)".bright_black());
    }
    for (level, step) in view.proof.iter().enumerate() {
        let sibling = step.sibling.as_deref().map(|s| short(s, 16)).unwrap_or("-");
        println!(
            "  {} {:<6} {}",
            format!("{}.", level + 1).bright_black(),
            step.position,
            sibling.bright_yellow()
        );
    }
    println!();

    if view.valid {
        println!("{}  Proof is valid", "✓".green().bold());
    } else {
        println!("{}  Proof does not match the stored root", "✗".red().bold());
    }
    println!();

    Ok(())
}

fn verify_proof(
    data_dir: PathBuf,
    idx: u64,
    leaf: Option<String>,
    proof_file: PathBuf,
) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;

    let contents = fs::read_to_string(&proof_file)
        .with_context(|| format!("Failed to read {}", proof_file.display()))?;
    let parsed: ProofFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid proof file: {}", proof_file.display()))?;

    let (leaf, steps) = match (leaf, parsed) {
        (Some(hex), ProofFile::View(view)) => (parse_leaf(&hex)?, view.proof),
        (None, ProofFile::View(view)) => (parse_leaf(&view.leaf)?, view.proof),
        (Some(hex), ProofFile::Steps(steps)) => (parse_leaf(&hex)?, steps),
        (None, ProofFile::Steps(_)) => {
            bail!("--leaf is required when the proof file only holds steps")
        }
    };

    let valid = ledger.verify_encoded_proof(idx, &leaf, &steps)?;

    println!();
    println!("  Block: {}", idx.to_string().bright_cyan());
    println!("  Leaf:  {}", leaf.to_hex().bright_yellow());
    println!();

    if !valid {
        bail!("Proof does not match the merkle root of block {}", idx);
    }
    println!("{}  Proof is valid", "✓".green().bold());
    println!();

    Ok(())
}
