//! 1inch Adapter
//!
//! Implementation of the PriceOracle, ChainCatalog and WalletInspector ports
//! for the 1inch aggregator API.

mod client;
mod types;

pub use client::{OneInchClient, OneInchConfig};
pub use types::{QuoteResponse, TokenInfo, TokenListResponse};
