use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TokenMetadata;

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("REST API error: {0}")]
    RestError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// A price quote: `amount_out` of the quoted token for `amount_in` of the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: u128,
    pub amount_out: u128,
    /// Estimated gas units, when the provider reports it
    pub gas: Option<u64>,
}

impl Quote {
    pub fn new(amount_in: u128, amount_out: u128) -> Self {
        Self {
            amount_in,
            amount_out,
            gas: None,
        }
    }

    /// The integer price used for delta math
    pub fn price(&self) -> u128 {
        self.amount_out
    }
}

/// Price source for scoring and probing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Quote how much of `token_id` is received for `amount` of `reference_id`
    async fn quote(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<Quote, OracleError>;
}

/// Token discovery for the bootstrapping phase
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainCatalog: Send + Sync {
    /// List the tradable tokens of a chain keyed by token id
    async fn discover_tokens(
        &self,
        chain_id: u64,
    ) -> Result<HashMap<String, TokenMetadata>, OracleError>;
}

#[async_trait]
impl<T: PriceOracle + ?Sized> PriceOracle for std::sync::Arc<T> {
    async fn quote(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<Quote, OracleError> {
        (**self).quote(token_id, reference_id, amount).await
    }
}

#[async_trait]
impl<T: ChainCatalog + ?Sized> ChainCatalog for std::sync::Arc<T> {
    async fn discover_tokens(
        &self,
        chain_id: u64,
    ) -> Result<HashMap<String, TokenMetadata>, OracleError> {
        (**self).discover_tokens(chain_id).await
    }
}
