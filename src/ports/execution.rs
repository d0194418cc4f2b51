use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::market_data::PriceOracle;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Transaction execution failed: {0}")]
    ExecutionError(String),
    #[error("Insufficient balance of {token}: have {have}, need {need}")]
    InsufficientBalance { token: String, have: u128, need: u128 },
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Request timed out")]
    Timeout,
}

/// Receipt of an executed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub tx_hash: String,
    pub from_token: String,
    pub to_token: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub timestamp: DateTime<Utc>,
}

/// Result of a forward-then-reverse liquidity probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTrip {
    /// Reference amount sent
    pub amount_in: u128,
    /// Token amount received on the forward leg
    pub amount_out: u128,
    /// Reference amount received back on the reverse leg
    pub amount_back: u128,
}

impl RoundTrip {
    /// Value lost over the round trip, in basis points (rounded down)
    pub fn loss_bps(&self) -> u128 {
        if self.amount_in == 0 || self.amount_back >= self.amount_in {
            return 0;
        }
        (self.amount_in - self.amount_back).saturating_mul(10_000) / self.amount_in
    }

    /// Whether the loss strictly exceeds `max_bps`, compared without rounding
    pub fn exceeds_loss(&self, max_bps: u32) -> bool {
        if self.amount_in == 0 {
            return true;
        }
        let lost = self.amount_in.saturating_sub(self.amount_back);
        lost.saturating_mul(10_000) > self.amount_in.saturating_mul(max_bps as u128)
    }
}

/// Swap execution for buys, sells and liquidation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn swap(
        &self,
        from_token: &str,
        to_token: &str,
        amount: u128,
    ) -> Result<SwapReceipt, ExecutionError>;
}

/// Wallet holdings, used to reconcile the trading set
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletInspector: Send + Sync {
    /// Non-zero balances keyed by token id
    async fn balances(&self) -> Result<HashMap<String, u128>, ExecutionError>;
}

/// One-shot round-trip liquidity probe
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVetter: Send + Sync {
    /// Quote `amount` of `reference_id` into `token_id`, then the result back
    async fn probe(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<RoundTrip, ExecutionError>;
}

/// Vetter that runs the probe as two oracle quotes, without moving funds
pub struct RoundTripVetter<O> {
    oracle: O,
}

impl<O: PriceOracle> RoundTripVetter<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl<O: PriceOracle> TokenVetter for RoundTripVetter<O> {
    async fn probe(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<RoundTrip, ExecutionError> {
        let forward = self
            .oracle
            .quote(token_id, reference_id, amount)
            .await
            .map_err(|e| ExecutionError::ApiError(format!("Forward quote failed: {}", e)))?;

        if forward.amount_out == 0 {
            return Err(ExecutionError::ExecutionError(format!(
                "Forward quote for {} returned nothing",
                token_id
            )));
        }

        let reverse = self
            .oracle
            .quote(reference_id, token_id, forward.amount_out)
            .await
            .map_err(|e| ExecutionError::ApiError(format!("Reverse quote failed: {}", e)))?;

        Ok(RoundTrip {
            amount_in: amount,
            amount_out: forward.amount_out,
            amount_back: reverse.amount_out,
        })
    }
}

#[async_trait]
impl<T: SwapExecutor + ?Sized> SwapExecutor for Arc<T> {
    async fn swap(
        &self,
        from_token: &str,
        to_token: &str,
        amount: u128,
    ) -> Result<SwapReceipt, ExecutionError> {
        (**self).swap(from_token, to_token, amount).await
    }
}

#[async_trait]
impl<T: WalletInspector + ?Sized> WalletInspector for Arc<T> {
    async fn balances(&self) -> Result<HashMap<String, u128>, ExecutionError> {
        (**self).balances().await
    }
}

#[async_trait]
impl<T: TokenVetter + ?Sized> TokenVetter for Arc<T> {
    async fn probe(
        &self,
        token_id: &str,
        reference_id: &str,
        amount: u128,
    ) -> Result<RoundTrip, ExecutionError> {
        (**self).probe(token_id, reference_id, amount).await
    }
}
