//! CLI commands module.

use anyhow::Result;
use chrono::DateTime;
use clap::Subcommand;
use serde::Serialize;

mod block;
mod chain;
mod init;
mod locate;
mod proof;
mod report;
mod submit;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ledger
    Init(init::InitArgs),
    /// Submit an evidence report as a new block
    Submit(submit::SubmitArgs),
    /// Block explorer
    Block(block::BlockArgs),
    /// Merkle inclusion proofs
    Proof(proof::ProofArgs),
    /// Chain audit and timeline
    Chain(chain::ChainArgs),
    /// Find evidence in the chain by file or digest
    Locate(locate::LocateArgs),
    /// Stored evidence reports
    Report(report::ReportArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Submit(args) => submit::run(args),
        Commands::Block(args) => block::run(args),
        Commands::Proof(args) => proof::run(args),
        Commands::Chain(args) => chain::run(args),
        Commands::Locate(args) => locate::run(args),
        Commands::Report(args) => report::run(args),
    }
}

/// Render a Unix timestamp as UTC.
pub(crate) fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// First `len` characters of a hex digest.
pub(crate) fn short(hex: &str, len: usize) -> &str {
    hex.get(..len).unwrap_or(hex)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
