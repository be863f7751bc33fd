//! dursearch - Search the Korean DUR drug-safety item lists
//!
//! dursearch provides:
//! - Encoding and delimiter detection for the published CSV lists
//! - An in-memory medicine catalog with replace-per-file or merge loading
//! - Partial-name search grouped by base item name
//! - Exact lookup and lookup diagnostics
//! - Unified output format (json/jsonl/md)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dursearch::cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dursearch={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cli::run(cli)
}
