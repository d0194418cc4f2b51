//! In-memory port implementations for unit and integration tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::execution::{
    ExecutionError, RoundTrip, SwapExecutor, SwapReceipt, TokenVetter, WalletInspector,
};
use super::market_data::{ChainCatalog, OracleError, PriceOracle, Quote};
use crate::domain::TokenMetadata;

/// Oracle that replays a scripted price sequence per token.
///
/// Once a script is exhausted the last price repeats. Scripted failures are
/// consumed like prices.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOracle {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<u128, OracleError>>>>>,
    last: Arc<Mutex<HashMap<String, u128>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to script a price sequence for a token
    pub fn with_prices(self, token_id: &str, prices: &[u128]) -> Self {
        for p in prices {
            self.push_price(token_id, *p);
        }
        self
    }

    /// Append one price to a token's script
    pub fn push_price(&self, token_id: &str, price: u128) {
        self.scripts
            .lock()
            .unwrap()
            .entry(token_id.to_string())
            .or_default()
            .push_back(Ok(price));
    }

    /// Append one failed quote to a token's script
    pub fn push_failure(&self, token_id: &str, error: OracleError) {
        self.scripts
            .lock()
            .unwrap()
            .entry(token_id.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Token ids quoted so far, in call order
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceOracle for ScriptedOracle {
    async fn quote(
        &self,
        token_id: &str,
        _reference_id: &str,
        amount: u128,
    ) -> Result<Quote, OracleError> {
        self.calls.lock().unwrap().push(token_id.to_string());

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(token_id)
            .and_then(|q| q.pop_front());

        let price = match next {
            Some(Ok(price)) => {
                self.last.lock().unwrap().insert(token_id.to_string(), price);
                price
            }
            Some(Err(e)) => return Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .get(token_id)
                .copied()
                .ok_or_else(|| OracleError::RestError(format!("No price scripted for {}", token_id)))?,
        };

        Ok(Quote::new(amount, price))
    }
}

/// Catalog returning a fixed token list
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    tokens: HashMap<String, TokenMetadata>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, id: &str, symbol: &str, decimals: u8) -> Self {
        self.tokens
            .insert(id.to_string(), TokenMetadata::new(symbol, symbol, decimals));
        self
    }
}

#[async_trait]
impl ChainCatalog for StaticCatalog {
    async fn discover_tokens(
        &self,
        _chain_id: u64,
    ) -> Result<HashMap<String, TokenMetadata>, OracleError> {
        Ok(self.tokens.clone())
    }
}

/// Wallet that records swaps and fills them 1:1
#[derive(Debug, Default, Clone)]
pub struct RecordingWallet {
    balances: Arc<Mutex<HashMap<String, u128>>>,
    swaps: Arc<Mutex<Vec<(String, String, u128)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, token_id: &str, amount: u128) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(token_id.to_string(), amount);
        self
    }

    /// Make every swap out of `token_id` fail
    pub fn with_failing_token(self, token_id: &str) -> Self {
        self.failing.lock().unwrap().insert(token_id.to_string());
        self
    }

    pub fn balance_of(&self, token_id: &str) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(token_id)
            .copied()
            .unwrap_or(0)
    }

    /// Recorded swaps as `(from, to, amount)`
    pub fn get_swaps(&self) -> Vec<(String, String, u128)> {
        self.swaps.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapExecutor for RecordingWallet {
    async fn swap(
        &self,
        from_token: &str,
        to_token: &str,
        amount: u128,
    ) -> Result<SwapReceipt, ExecutionError> {
        if self.failing.lock().unwrap().contains(from_token) {
            return Err(ExecutionError::ExecutionError(format!(
                "Scripted failure for {}",
                from_token
            )));
        }

        let mut balances = self.balances.lock().unwrap();
        let have = balances.get(from_token).copied().unwrap_or(0);
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                token: from_token.to_string(),
                have,
                need: amount,
            });
        }
        balances.insert(from_token.to_string(), have - amount);
        *balances.entry(to_token.to_string()).or_insert(0) += amount;
        drop(balances);

        let mut swaps = self.swaps.lock().unwrap();
        swaps.push((from_token.to_string(), to_token.to_string(), amount));

        Ok(SwapReceipt {
            tx_hash: format!("0xmock{:04}", swaps.len()),
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount_in: amount,
            amount_out: amount,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl WalletInspector for RecordingWallet {
    async fn balances(&self) -> Result<HashMap<String, u128>, ExecutionError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}

/// Vetter with a configured loss per token that counts its probes
#[derive(Debug, Default, Clone)]
pub struct CountingVetter {
    loss_bps: Arc<Mutex<HashMap<String, u128>>>,
    probes: Arc<Mutex<HashMap<String, u32>>>,
}

impl CountingVetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round-trip loss reported for a token (default: lossless)
    pub fn with_loss(self, token_id: &str, loss_bps: u128) -> Self {
        self.loss_bps
            .lock()
            .unwrap()
            .insert(token_id.to_string(), loss_bps);
        self
    }

    pub fn probe_count(&self, token_id: &str) -> u32 {
        self.probes
            .lock()
            .unwrap()
            .get(token_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TokenVetter for CountingVetter {
    async fn probe(
        &self,
        token_id: &str,
        _reference_id: &str,
        amount: u128,
    ) -> Result<RoundTrip, ExecutionError> {
        *self
            .probes
            .lock()
            .unwrap()
            .entry(token_id.to_string())
            .or_insert(0) += 1;

        let loss = self
            .loss_bps
            .lock()
            .unwrap()
            .get(token_id)
            .copied()
            .unwrap_or(0);

        Ok(RoundTrip {
            amount_in: amount,
            amount_out: amount,
            amount_back: amount - amount * loss / 10_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_oracle_replays_then_repeats() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[1000, 950]);

        assert_eq!(oracle.quote("0xa", "0xn", 1).await.unwrap().price(), 1000);
        assert_eq!(oracle.quote("0xa", "0xn", 1).await.unwrap().price(), 950);
        assert_eq!(oracle.quote("0xa", "0xn", 1).await.unwrap().price(), 950);
        assert!(oracle.quote("0xb", "0xn", 1).await.is_err());
        assert_eq!(oracle.get_calls(), vec!["0xa", "0xa", "0xa", "0xb"]);
    }

    #[tokio::test]
    async fn test_scripted_oracle_failure() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[1000]);
        oracle.push_failure("0xa", OracleError::Timeout);
        oracle.push_price("0xa", 900);

        assert!(oracle.quote("0xa", "0xn", 1).await.is_ok());
        assert_eq!(oracle.quote("0xa", "0xn", 1).await, Err(OracleError::Timeout));
        assert_eq!(oracle.quote("0xa", "0xn", 1).await.unwrap().price(), 900);
    }

    #[tokio::test]
    async fn test_recording_wallet_swaps() {
        let wallet = RecordingWallet::new().with_balance("0xn", 100);

        wallet.swap("0xn", "0xa", 40).await.unwrap();
        assert_eq!(wallet.balance_of("0xn"), 60);
        assert_eq!(wallet.balance_of("0xa"), 40);

        let err = wallet.swap("0xn", "0xa", 100).await.unwrap_err();
        assert!(matches!(err, ExecutionError::InsufficientBalance { have: 60, .. }));
        assert_eq!(wallet.get_swaps().len(), 1);
    }

    #[tokio::test]
    async fn test_counting_vetter() {
        let vetter = CountingVetter::new().with_loss("0xa", 100);
        let rt = vetter.probe("0xa", "0xn", 10_000).await.unwrap();
        assert_eq!(rt.amount_back, 9_900);
        assert_eq!(vetter.probe_count("0xa"), 1);
        assert_eq!(vetter.probe_count("0xb"), 0);
    }
}
