//! Token
//!
//! A tradable token tracked on one chain. Descriptive fields are fixed at
//! creation; trading state is only mutated through the `RankedTokenIndex`.

use serde::{Deserialize, Serialize};

/// Descriptive token metadata as reported by a chain catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// A ranked token and its momentum state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    id: String,
    chain_id: u64,
    name: String,
    symbol: String,
    decimals: u8,
    /// Momentum score (higher = more favorable)
    pub(crate) score: f64,
    /// Last observed price in smallest units; None before the first observation
    pub(crate) last_price: Option<u128>,
    /// Price at creation, used only for ROI reporting
    initial_price: u128,
    /// Consecutive unfavorable observations
    pub(crate) strikes: u32,
    /// Whether the round-trip liquidity probe has run
    pub(crate) tested: bool,
    /// Probe verdict; meaningful only once `tested` is true
    pub(crate) whitelisted: bool,
}

impl Token {
    /// Create a token from its first price observation
    pub fn new(
        id: impl Into<String>,
        chain_id: u64,
        metadata: TokenMetadata,
        score: f64,
        initial_price: u128,
    ) -> Self {
        Self {
            id: id.into(),
            chain_id,
            name: metadata.name,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
            score,
            last_price: Some(initial_price),
            initial_price,
            strikes: 0,
            tested: false,
            whitelisted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn last_price(&self) -> Option<u128> {
        self.last_price
    }

    pub fn initial_price(&self) -> u128 {
        self.initial_price
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    pub fn is_tested(&self) -> bool {
        self.tested
    }

    pub fn is_whitelisted(&self) -> bool {
        self.tested && self.whitelisted
    }

    /// Return since creation in percent.
    ///
    /// Prices are "units of this token per reference amount", so a lower
    /// price means the token appreciated against the reference.
    pub fn roi_pct(&self) -> f64 {
        match self.last_price {
            Some(last) if self.initial_price > 0 => {
                (self.initial_price as f64 - last as f64) / self.initial_price as f64 * 100.0
            }
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token(id={}, symbol={}, score={:.3}, last_price={}, strikes={})",
            self.id,
            self.symbol,
            self.score,
            self.last_price.map_or_else(|| "-".to_string(), |p| p.to_string()),
            self.strikes
        )
    }
}
