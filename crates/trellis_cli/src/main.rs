//! Trellis CLI
//!
//! Developer tools for the Trellis sync server.
//!
//! # Commands
//!
//! - `replay` - Run a JSON script of requests against an in-process server
//! - `permanent-items` - List the server-created containers
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trellis_server::{ServerConfig, DEFAULT_BATCH_SIZE};

/// Trellis sync server tools.
#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script of requests against a fresh in-process server
    Replay {
        /// Path to a JSON array of requests
        script: PathBuf,

        /// Fixed store birthday (random if omitted)
        #[arg(short, long)]
        birthday: Option<String>,

        /// Changes scanned per GetUpdates request (at least 1)
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: NonZeroUsize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the permanent items the server creates on demand
    PermanentItems {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            script,
            birthday,
            batch_size,
            format,
        } => {
            let mut config = ServerConfig::new().with_batch_size(batch_size);
            if let Some(birthday) = birthday {
                config = config.with_store_birthday(birthday);
            }
            commands::replay::run(&script, config, &format)?;
        }
        Commands::PermanentItems { format } => {
            commands::permanent_items::run(&format)?;
        }
        Commands::Version => {
            println!("Trellis CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn replay_batch_size_defaults_and_parses() {
        let cli = Cli::try_parse_from(["trellis", "replay", "script.json"]).unwrap();
        let Commands::Replay { batch_size, .. } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(batch_size, DEFAULT_BATCH_SIZE);

        let cli = Cli::try_parse_from(["trellis", "replay", "s.json", "--batch-size", "1"]).unwrap();
        let Commands::Replay { batch_size, .. } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(batch_size.get(), 1);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = Cli::try_parse_from(["trellis", "replay", "s.json", "--batch-size", "0"]);
        assert!(result.is_err());
    }
}
