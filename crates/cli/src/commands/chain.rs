//! Chain audit and timeline command.

use super::{format_timestamp, print_json, short};
use crate::workspace::Workspace;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ChainArgs {
    #[command(subcommand)]
    command: ChainCommand,
}

#[derive(Subcommand)]
enum ChainCommand {
    /// Recheck every block and link in the chain
    Audit {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show all blocks, newest first, with their transactions
    Timeline {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(args: ChainArgs) -> Result<()> {
    match args.command {
        ChainCommand::Audit { data_dir, json } => audit(data_dir, json),
        ChainCommand::Timeline { data_dir, json } => timeline(data_dir, json),
    }
}

fn audit(data_dir: PathBuf, json: bool) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;
    let report = ledger.audit();

    if json {
        print_json(&report)?;
    } else {
        println!();
        println!("{}", "Chain Audit:".bold().cyan());
        println!();
        println!(
            "  Blocks checked: {}",
            report.blocks_checked.to_string().bright_cyan()
        );
        println!(
            "  Problems:       {}",
            report.problems.len().to_string().bright_cyan()
        );
        println!();

        for problem in &report.problems {
            let kind = if problem.kind.is_fatal() {
                problem.kind.to_string().red().bold()
            } else {
                problem.kind.to_string().yellow()
            };
            println!(
                "  {} {} {}",
                format!("#{}", problem.block_idx).bright_black(),
                kind,
                problem.detail
            );
        }
        if !report.problems.is_empty() {
            println!();
        }
    }

    if !report.ok {
        bail!("Chain integrity check failed");
    }
    if !json {
        println!("{}", "Chain is intact".green().bold());
        println!();
    }

    Ok(())
}

fn timeline(data_dir: PathBuf, json: bool) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;
    let entries = ledger.timeline();

    if json {
        return print_json(&entries);
    }

    println!();
    println!("{}", "Timeline:".bold().cyan());
    println!();

    if entries.is_empty() {
        println!("  {}", "No blocks yet".bright_black());
        println!();
    }

    for entry in &entries {
        println!(
            "  {} {} {}",
            format!("#{}", entry.idx).bright_black(),
            short(&entry.block_hash, 16).bright_yellow(),
            format_timestamp(entry.timestamp).bright_black()
        );
        for tx in &entry.transactions {
            println!(
                "     {} {} {}",
                tx.title,
                format!("by {}", tx.uploader).bright_black(),
                tx.tx_id.bright_black()
            );
        }
        println!();
    }

    Ok(())
}
