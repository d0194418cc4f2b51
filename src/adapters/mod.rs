//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - 1inch: aggregator API client (quotes, token lists, balances)
//! - Paper: in-memory wallet that simulates swaps at oracle quotes
//! - CLI: Command-line interface definitions

pub mod cli;
pub mod one_inch;
pub mod paper;

pub use cli::CliApp;
pub use one_inch::{OneInchClient, OneInchConfig};
pub use paper::{PaperTrade, PaperWallet};
