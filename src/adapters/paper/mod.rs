//! Paper Wallet
//!
//! Simulated wallet for running the rotator without real funds. Swaps fill at
//! the oracle's quote minus a configurable slippage, balances live in memory
//! and every fill is appended to a trade log. Nothing is ever signed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::ports::{ExecutionError, PriceOracle, SwapExecutor, SwapReceipt, WalletInspector};

/// A single simulated fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperTrade {
    pub id: u64,
    pub from_token: String,
    pub to_token: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub slippage_bps: u16,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PaperState {
    balances: HashMap<String, u128>,
    trades: Vec<PaperTrade>,
    next_trade_id: u64,
}

/// In-memory wallet that fills swaps at oracle quotes
pub struct PaperWallet<O> {
    oracle: O,
    slippage_bps: u16,
    state: Mutex<PaperState>,
}

impl<O: PriceOracle> PaperWallet<O> {
    /// Create a wallet funded with `initial_amount` of `token_id`
    pub fn new(oracle: O, token_id: &str, initial_amount: u128) -> Self {
        info!(
            "Paper wallet initialized with {} of {}",
            initial_amount, token_id
        );

        let mut balances = HashMap::new();
        if initial_amount > 0 {
            balances.insert(token_id.to_string(), initial_amount);
        }

        Self {
            oracle,
            slippage_bps: 50,
            state: Mutex::new(PaperState {
                balances,
                trades: Vec::new(),
                next_trade_id: 1,
            }),
        }
    }

    /// Set the simulated slippage in basis points (100 = 1%)
    pub fn with_slippage(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub async fn balance_of(&self, token_id: &str) -> u128 {
        self.state
            .lock()
            .await
            .balances
            .get(token_id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn trades(&self) -> Vec<PaperTrade> {
        self.state.lock().await.trades.clone()
    }

    pub async fn export_trades_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.state.lock().await.trades)
    }

    /// Log a one-line summary of holdings and fills
    pub async fn log_summary(&self) {
        let state = self.state.lock().await;
        info!(
            "Paper wallet: {} trades, {} holdings",
            state.trades.len(),
            state.balances.len()
        );
        for (token, amount) in &state.balances {
            info!("  {}: {}", token, amount);
        }
    }
}

#[async_trait]
impl<O: PriceOracle> SwapExecutor for PaperWallet<O> {
    async fn swap(
        &self,
        from_token: &str,
        to_token: &str,
        amount: u128,
    ) -> Result<SwapReceipt, ExecutionError> {
        if amount == 0 {
            return Err(ExecutionError::InvalidParameters(
                "Swap amount must be positive".to_string(),
            ));
        }
        if from_token == to_token {
            return Err(ExecutionError::InvalidParameters(format!(
                "Cannot swap {} into itself",
                from_token
            )));
        }

        // Held across the quote so two swaps can never spend the same balance
        let mut state = self.state.lock().await;

        let have = state.balances.get(from_token).copied().unwrap_or(0);
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                token: from_token.to_string(),
                have,
                need: amount,
            });
        }

        let quote = self
            .oracle
            .quote(to_token, from_token, amount)
            .await
            .map_err(|e| ExecutionError::ApiError(format!("Quote failed: {}", e)))?;

        let amount_out = quote.amount_out / 10_000 * (10_000 - self.slippage_bps as u128)
            + quote.amount_out % 10_000 * (10_000 - self.slippage_bps as u128) / 10_000;
        if amount_out == 0 {
            return Err(ExecutionError::ExecutionError(format!(
                "Swap of {} {} into {} yields nothing",
                amount, from_token, to_token
            )));
        }

        let remaining = have - amount;
        if remaining == 0 {
            state.balances.remove(from_token);
        } else {
            state.balances.insert(from_token.to_string(), remaining);
        }
        *state.balances.entry(to_token.to_string()).or_insert(0) += amount_out;

        let trade = PaperTrade {
            id: state.next_trade_id,
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount_in: amount,
            amount_out,
            slippage_bps: self.slippage_bps,
            timestamp: Utc::now(),
        };
        state.next_trade_id += 1;

        info!(
            "PAPER SWAP #{} - {} {} -> {} {}",
            trade.id, amount, from_token, amount_out, to_token
        );

        let receipt = SwapReceipt {
            tx_hash: format!("paper-{}", trade.id),
            from_token: trade.from_token.clone(),
            to_token: trade.to_token.clone(),
            amount_in: amount,
            amount_out,
            timestamp: trade.timestamp,
        };
        state.trades.push(trade);

        Ok(receipt)
    }
}

#[async_trait]
impl<O: PriceOracle> WalletInspector for PaperWallet<O> {
    async fn balances(&self) -> Result<HashMap<String, u128>, ExecutionError> {
        Ok(self.state.lock().await.balances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::ScriptedOracle;
    use crate::ports::OracleError;

    const NATIVE: &str = "0xnative";

    #[tokio::test]
    async fn test_swap_fills_at_quote_minus_slippage() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[20_000]);
        let wallet = PaperWallet::new(oracle, NATIVE, 1_000).with_slippage(100);

        let receipt = wallet.swap(NATIVE, "0xa", 400).await.unwrap();
        assert_eq!(receipt.amount_out, 19_800);
        assert_eq!(receipt.tx_hash, "paper-1");

        assert_eq!(wallet.balance_of(NATIVE).await, 600);
        assert_eq!(wallet.balance_of("0xa").await, 19_800);
        assert_eq!(wallet.trades().await.len(), 1);
    }

    #[tokio::test]
    async fn test_full_sell_removes_holding() {
        let oracle = ScriptedOracle::new().with_prices(NATIVE, &[300]);
        let wallet = PaperWallet::new(oracle, "0xa", 500).with_slippage(0);

        wallet.swap("0xa", NATIVE, 500).await.unwrap();
        let balances = wallet.balances().await.unwrap();
        assert!(!balances.contains_key("0xa"));
        assert_eq!(balances[NATIVE], 300);
    }

    #[tokio::test]
    async fn test_insufficient_balance() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[1]);
        let wallet = PaperWallet::new(oracle, NATIVE, 10);

        let err = wallet.swap(NATIVE, "0xa", 11).await.unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InsufficientBalance {
                token: NATIVE.to_string(),
                have: 10,
                need: 11
            }
        );
        assert!(wallet.trades().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_quote_leaves_balances() {
        let oracle = ScriptedOracle::new();
        oracle.push_failure("0xa", OracleError::Timeout);
        let wallet = PaperWallet::new(oracle, NATIVE, 10);

        assert!(matches!(
            wallet.swap(NATIVE, "0xa", 5).await,
            Err(ExecutionError::ApiError(_))
        ));
        assert_eq!(wallet.balance_of(NATIVE).await, 10);
    }

    #[tokio::test]
    async fn test_export_trades() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[100]);
        let wallet = PaperWallet::new(oracle, NATIVE, 10).with_slippage(0);
        wallet.swap(NATIVE, "0xa", 5).await.unwrap();

        let json = wallet.export_trades_json().await.unwrap();
        let trades: Vec<PaperTrade> = serde_json::from_str(&json).unwrap();
        assert_eq!(trades[0].amount_out, 100);
    }
}
