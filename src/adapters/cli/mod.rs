//! CLI Adapter
//!
//! Command-line interface for the rotator.
//! Uses clap derive macros for argument parsing.

mod commands;
mod control;

pub use commands::{CheckConfigCmd, CliApp, Command, DiscoverCmd, QuoteCmd, RunCmd};
pub use control::{ControlCommand, ControlParseError};

/// Parse the command line
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
