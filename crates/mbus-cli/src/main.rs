//! # mbus CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mbus_cli::config::{run_config, ConfigArgs};
use mbus_cli::hash::{run_hash, HashArgs};
use mbus_cli::storage::{run_storage_key, StorageKeyArgs};
use mbus_cli::verify::{run_verify, VerifyArgs};

/// Cross-ledger message bus facilitator tooling.
#[derive(Parser, Debug)]
#[command(name = "mbus", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute intent hash, message hash and hash lock.
    Hash(HashArgs),

    /// Derive the storage slot and trie key of a message status.
    StorageKey(StorageKeyArgs),

    /// Verify a storage proof against a root.
    Verify(VerifyArgs),

    /// Load and validate a gateway config.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Hash(args) => run_hash(args),
        Commands::StorageKey(args) => run_storage_key(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Config(args) => run_config(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbus_cli::SideArg;

    #[test]
    fn cli_parse_storage_key() {
        let hash = format!("0x{}", "11".repeat(32));
        let cli = Cli::try_parse_from(["mbus", "storage-key", &hash, "--side", "inbox"]).unwrap();
        match cli.command {
            Commands::StorageKey(args) => {
                assert_eq!(args.side, SideArg::Inbox);
                assert_eq!(args.position, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_hash_rejects_lock_and_secret() {
        let word = format!("0x{}", "44".repeat(32));
        let addr = format!("0x{}", "11".repeat(20));
        let result = Cli::try_parse_from([
            "mbus", "hash", "--amount", "1000", "--beneficiary", &addr, "--gateway", &addr,
            "--sender", &addr, "--nonce", "1", "--hash-lock", &word, "--secret", &word,
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_verify_status() {
        let word = format!("0x{}", "44".repeat(32));
        let cli = Cli::try_parse_from([
            "mbus", "verify", "proof.json", "--root", &word, "--message-hash", &word,
            "--side", "outbox", "--status", "declared-revocation", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Verify(_)));
    }
}
