//! CLI Commands
//!
//! Argument definitions for the rotator binary. Handlers live in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Rotator - Multi-chain momentum token rotation over the 1inch aggregator
#[derive(Parser, Debug)]
#[command(
    name = "rotator",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Multi-chain momentum token rotation over the 1inch aggregator",
    long_about = "Rotator scores every token on each configured chain by price momentum, \
                  keeps a small vetted trading set of the strongest ones and falls back \
                  to the chain's stable token when the native token weakens."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the chain workers
    Run(RunCmd),

    /// Print one price quote
    Quote(QuoteCmd),

    /// List the tokens tradable on a chain
    Discover(DiscoverCmd),

    /// Validate a configuration file
    CheckConfig(CheckConfigCmd),
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Quote(cmd) => &cmd.config,
            Command::Discover(cmd) => &cmd.config,
            Command::CheckConfig(cmd) => &cmd.config,
        }
    }
}

/// Start chain workers
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,

    /// Only run this chain (default: every configured chain)
    #[arg(long, value_name = "NAME")]
    pub chain: Option<String>,

    /// Export the paper trade log to this file on shutdown
    #[arg(long, value_name = "FILE")]
    pub export_trades: Option<PathBuf>,
}

/// Print one quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Token address to price
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Chain to quote on
    #[arg(long, value_name = "NAME")]
    pub chain: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,
}

/// List tradable tokens
#[derive(Parser, Debug)]
pub struct DiscoverCmd {
    /// Chain to list
    #[arg(long, value_name = "NAME")]
    pub chain: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,

    /// Only print the first N tokens
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let app = CliApp::parse_from(["rotator", "run", "--config", "my.toml", "--chain", "base"]);
        match app.command {
            Command::Run(ref cmd) => {
                assert_eq!(cmd.chain.as_deref(), Some("base"));
                assert!(cmd.export_trades.is_none());
            }
            _ => panic!("expected run"),
        }
        assert_eq!(app.command.config_path(), Path::new("my.toml"));
    }

    #[test]
    fn test_parse_quote_with_global_flag() {
        let app = CliApp::parse_from(["rotator", "quote", "0xabc", "--chain", "polygon", "--debug"]);
        assert!(app.debug);
        assert!(!app.verbose);
        match app.command {
            Command::Quote(cmd) => {
                assert_eq!(cmd.token, "0xabc");
                assert_eq!(cmd.config, PathBuf::from("config/example.toml"));
            }
            _ => panic!("expected quote"),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let app = CliApp::parse_from(["rotator", "-v", "check-config"]);
        assert!(app.verbose);
        assert!(matches!(app.command, Command::CheckConfig(_)));
    }

    #[test]
    fn test_discover_requires_chain() {
        assert!(CliApp::try_parse_from(["rotator", "discover"]).is_err());
    }
}
