//! Initialize ledger command.

use crate::config::Config;
use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use blockwitness_core::HashAlgorithm;
use blockwitness_ledger::{LedgerConfig, DEFAULT_MAX_BLOCK_SIZE};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Digest algorithm (blake3 or sha256)
    #[arg(long, default_value = "blake3")]
    hash: HashAlgorithm,

    /// Maximum transactions per block
    #[arg(short, long, default_value_t = DEFAULT_MAX_BLOCK_SIZE)]
    max_block_size: usize,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing blockwitness ledger...".bold().cyan());
    println!();

    if Config::exists(&args.data_dir) {
        bail!("Ledger already initialized in {}", args.data_dir.display());
    }

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;
    println!("{}  Created data directory", "✓".green().bold());

    let config = Config {
        hash: args.hash,
        ledger: LedgerConfig::default().with_max_block_size(args.max_block_size),
    };
    config.save(&args.data_dir)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        Config::path(&args.data_dir).display().to_string().bright_black()
    );

    // Creates the empty database.
    Workspace::open(&args.data_dir)?;

    println!();
    println!("  Hash:           {}", config.hash.to_string().bright_yellow());
    println!(
        "  Max block size: {}",
        config.ledger.max_block_size.to_string().bright_cyan()
    );
    println!();
    println!("{}", "Ledger initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to record evidence",
        "blockwitness submit".bright_cyan()
    );
    println!(
        "  • Use {} to explore blocks",
        "blockwitness block list".bright_cyan()
    );

    Ok(())
}
