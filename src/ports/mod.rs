//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Price quotes and token discovery (`market_data`)
//! - Swaps, wallet balances and liquidity probes (`execution`)
//!
//! `mocks` holds scripted in-memory implementations for tests.

pub mod market_data;
pub mod execution;
pub mod mocks;

pub use market_data::{ChainCatalog, OracleError, PriceOracle, Quote};
pub use execution::{
    ExecutionError, RoundTrip, RoundTripVetter, SwapExecutor, SwapReceipt, TokenVetter,
    WalletInspector,
};
