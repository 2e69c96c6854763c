//! Block explorer command.

use super::{format_timestamp, print_json, short};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// List recent blocks
    List {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show detailed block information
    Show {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block index
        idx: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::List {
            data_dir,
            count,
            json,
        } => list_blocks(data_dir, count, json),
        BlockCommand::Show {
            data_dir,
            idx,
            json,
        } => show_block(data_dir, idx, json),
    }
}

fn list_blocks(data_dir: PathBuf, count: usize, json: bool) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;
    let summaries = ledger.summaries(count);

    if json {
        return print_json(&summaries);
    }

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    if summaries.is_empty() {
        println!("  {}", "No blocks yet".bright_black());
    }

    for summary in &summaries {
        println!(
            "  {} {} {} {}",
            format!("#{}", summary.idx).bright_black(),
            short(&summary.block_hash, 16).bright_yellow(),
            format!("({} txs)", summary.tx_count).bright_black(),
            format_timestamp(summary.timestamp).bright_black()
        );
    }

    println!();
    Ok(())
}

fn show_block(data_dir: PathBuf, idx: u64, json: bool) -> Result<()> {
    let workspace = Workspace::open(&data_dir)?;
    let ledger = workspace.ledger()?;
    let detail = ledger.detail(idx)?;

    if json {
        return print_json(&detail);
    }

    let verification = ledger.block(idx)?.verify(ledger.hasher());
    let status = |ok: bool| {
        if ok {
            "ok".green()
        } else {
            "MISMATCH".red().bold()
        }
    };

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Index:         {}", detail.idx.to_string().bright_cyan());
    println!("  Hash:          {}", detail.block_hash.bright_yellow());
    println!("  Previous Hash: {}", detail.previous_hash.bright_black());
    println!("  Merkle Root:   {}", detail.merkle_root.bright_black());
    println!(
        "  Timestamp:     {}",
        format_timestamp(detail.timestamp).bright_black()
    );
    println!(
        "  Transactions:  {}",
        detail.transactions.len().to_string().bright_cyan()
    );
    println!("  Merkle Check:  {}", status(verification.merkle_ok));
    println!("  Hash Check:    {}", status(verification.hash_ok));
    println!();

    if !detail.transactions.is_empty() {
        println!("{}", "Transactions:".bold());
        println!();
        for (i, tx) in detail.transactions.iter().enumerate() {
            println!(
                "  {} {} {}",
                format!("{}.", i + 1).bright_black(),
                short(&tx.content_hash, 16).bright_yellow(),
                tx.title
            );
            println!(
                "     {} {} {}",
                tx.tx_id.bright_black(),
                tx.uploader.bright_black(),
                tx.report_id.bright_black()
            );
        }
        println!();
    }

    Ok(())
}
