//! Chain Worker
//!
//! Drives one chain through the run-state machine:
//!
//! ```text
//! Bootstrapping -> Scouting -> Managing -> Cooldown -> Bootstrapping
//!                  (self)      (self)      (counts down)
//! ```
//!
//! The worker exclusively owns its index, trading set and state. Every
//! external call is awaited one at a time under `call_timeout`; a failed or
//! timed out call skips that token or action for the pass without touching
//! any state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{IndexError, RankedTokenIndex, RunState, Token, TokenMetadata};
use crate::ports::{
    ChainCatalog, ExecutionError, OracleError, PriceOracle, SwapExecutor, SwapReceipt,
    TokenVetter, WalletInspector,
};
use crate::strategy::{
    FallbackReason, MomentumScorer, ScoreError, ScoringParams, TradingSetController,
    TradingSetParams,
};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Price oracle error: {0}")]
    Oracle(#[from] OracleError),
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("Native token {0} could not be priced")]
    NativeUnavailable(String),
}

/// Identity of the chain a worker runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub name: String,
    pub chain_id: u64,
    /// Gas token; reference for pricing every other token
    pub native_token: String,
    /// Reference for pricing the native token and target of the fallback
    pub stable_token: String,
}

/// Loop timing and quote sizing
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    /// Polls spent dormant in cooldown
    pub cooldown_passes: u32,
    pub call_timeout: Duration,
    /// Reference amount quoted when pricing ordinary tokens (in native units)
    pub quote_amount: u128,
    /// Reference amount quoted when pricing the native token (in stable units)
    pub native_quote_amount: u128,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            cooldown_passes: 120,
            call_timeout: Duration::from_secs(10),
            quote_amount: 10u128.pow(12),
            native_quote_amount: 10u128.pow(6),
        }
    }
}

/// External collaborators of one worker
#[derive(Clone)]
pub struct Collaborators {
    pub oracle: Arc<dyn PriceOracle>,
    pub catalog: Arc<dyn ChainCatalog>,
    pub wallet: Arc<dyn WalletInspector>,
    pub executor: Arc<dyn SwapExecutor>,
    pub vetter: Arc<dyn TokenVetter>,
}

/// Cloneable handle that asks a worker to fall back to stable.
///
/// Honored only while the worker is managing; otherwise dropped.
#[derive(Debug, Clone, Default)]
pub struct FallbackHandle(Arc<AtomicBool>);

impl FallbackHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Outcome of one re-scoring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    pub updated: usize,
    pub skipped: usize,
}

/// Status snapshot of a worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub chain: String,
    pub state: RunState,
    pub maturity: u32,
    pub pass: u64,
    pub indexed_tokens: usize,
    pub members: Vec<String>,
    pub native_score: Option<f64>,
    /// Native return since it was first indexed
    pub native_roi_pct: Option<f64>,
}

/// Per-chain ranking and trading loop
pub struct ChainWorker {
    chain: ChainSettings,
    settings: WorkerSettings,
    ports: Collaborators,
    scorer: MomentumScorer,
    index: RankedTokenIndex,
    set: TradingSetController,
    state: RunState,
    /// Completed cooldown cycles
    maturity: u32,
    pass: u64,
    fallback: FallbackHandle,
}

impl ChainWorker {
    pub fn new(
        chain: ChainSettings,
        settings: WorkerSettings,
        scoring: ScoringParams,
        set_params: TradingSetParams,
        ports: Collaborators,
    ) -> Self {
        let set = TradingSetController::new(
            set_params,
            chain.native_token.clone(),
            chain.stable_token.clone(),
        );

        Self {
            chain,
            settings,
            ports,
            scorer: MomentumScorer::new(scoring),
            index: RankedTokenIndex::new(),
            set,
            state: RunState::Bootstrapping,
            maturity: 0,
            pass: 0,
            fallback: FallbackHandle::default(),
        }
    }

    pub fn chain(&self) -> &ChainSettings {
        &self.chain
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn maturity(&self) -> u32 {
        self.maturity
    }

    pub fn index(&self) -> &RankedTokenIndex {
        &self.index
    }

    pub fn trading_set(&self) -> &TradingSetController {
        &self.set
    }

    pub fn fallback_handle(&self) -> FallbackHandle {
        self.fallback.clone()
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            chain: self.chain.name.clone(),
            state: self.state,
            maturity: self.maturity,
            pass: self.pass,
            indexed_tokens: self.index.len(),
            members: self.set.member_ids(),
            native_score: self.index.find(&self.chain.native_token).map(|t| t.score()),
            native_roi_pct: self.index.find(&self.chain.native_token).map(|t| t.roi_pct()),
        }
    }

    /// Run until the shutdown channel flips to `true` or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting chain worker - Poll interval: {:?}, Native: {}",
            self.settings.poll_interval, self.chain.native_token
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.tick().await {
                error!("Tick error: {}", e);
                // Continue running despite errors
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Chain worker stopped after {} passes", self.pass);
    }

    /// Execute one pass of the state machine and return the resulting state
    pub async fn tick(&mut self) -> Result<RunState, WorkerError> {
        self.pass += 1;

        let fallback_requested = self.fallback.take();
        if fallback_requested && !self.state.accepts_fallback() {
            info!("Fallback request ignored while {}", self.state);
        }

        match self.state {
            RunState::Bootstrapping => {
                let added = self.initialize_tokens().await?;
                info!("Bootstrap added {} tokens ({} indexed)", added, self.index.len());
                self.transition(RunState::Scouting);
            }
            RunState::Scouting => {
                self.rescore_all().await?;
                if self.ready_to_manage() {
                    self.transition(RunState::Managing);
                } else {
                    debug!(
                        "Scouting: {} members (need {})",
                        self.set.len(),
                        self.set.params().min_set_size
                    );
                }
            }
            RunState::Managing => {
                self.rescore_all().await?;

                let reason = if fallback_requested {
                    Some(FallbackReason::Requested)
                } else {
                    self.index
                        .find(&self.chain.native_token)
                        .and_then(|native| self.set.native_distress(native))
                };

                match reason {
                    Some(reason) => self.fall_back_to_stable(reason).await,
                    None => self.manage_holdings().await?,
                }
            }
            RunState::Cooldown { remaining_passes } => {
                if remaining_passes > 1 {
                    self.state = RunState::Cooldown {
                        remaining_passes: remaining_passes - 1,
                    };
                } else {
                    self.finish_cooldown()?;
                }
            }
        }

        Ok(self.state)
    }

    /// Discover the chain's tokens and index every new one that can be priced.
    ///
    /// The native token is always ensured, priced against the stable token.
    /// Tokens already indexed, as after a cooldown, only get their last price
    /// re-quoted so the next pass scores against a current observation.
    /// Returns the number of tokens added.
    pub async fn initialize_tokens(&mut self) -> Result<usize, WorkerError> {
        let discovered = self
            .call(self.ports.catalog.discover_tokens(self.chain.chain_id))
            .await
            .unwrap_or_else(|| Err(OracleError::Timeout))?;

        let mut ids: Vec<&String> = discovered.keys().collect();
        ids.sort();

        let mut added = 0;
        for id in ids {
            if *id == self.chain.native_token || *id == self.chain.stable_token {
                continue;
            }
            if self.index.contains(id) {
                self.refresh_price(id).await?;
                continue;
            }

            match self.quote_price(id).await {
                Ok(price) => {
                    let token = Token::new(
                        id.clone(),
                        self.chain.chain_id,
                        discovered[id].clone(),
                        self.scorer.initial_score(),
                        price,
                    );
                    info!("Indexed {}", token);
                    self.index.insert(token)?;
                    added += 1;
                }
                Err(e) => warn!("Skipping {} during bootstrap: {}", id, e),
            }
        }

        if self.index.contains(&self.chain.native_token) {
            let native_id = self.chain.native_token.clone();
            self.refresh_price(&native_id).await?;
        } else {
            let native_id = self.chain.native_token.clone();
            let price = self
                .quote_price(&native_id)
                .await
                .map_err(|_| WorkerError::NativeUnavailable(native_id.clone()))?;
            let metadata = discovered
                .get(&native_id)
                .cloned()
                .unwrap_or_else(|| TokenMetadata::new("Native", "NATIVE", 18));
            let token = Token::new(
                native_id,
                self.chain.chain_id,
                metadata,
                self.scorer.initial_score(),
                price,
            );
            info!("Indexed native {}", token);
            self.index.insert(token)?;
            added += 1;
        }

        Ok(added)
    }

    /// Re-quote an indexed token and keep its score and strikes.
    ///
    /// A failed quote leaves the old price in place.
    async fn refresh_price(&mut self, id: &str) -> Result<(), WorkerError> {
        let price = match self.quote_price(id).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Keeping previous price of {}: {}", id, e);
                return Ok(());
            }
        };

        let token = self
            .index
            .find(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        let (score, strikes, previous) = (token.score(), token.strikes(), token.last_price());

        self.index.update(id, score, price, strikes)?;
        debug!("Refreshed {} price {:?} -> {}", id, previous, price);
        Ok(())
    }

    /// Re-price every indexed token and apply the admission rules.
    ///
    /// A token whose quote fails or times out keeps its previous state.
    pub async fn rescore_all(&mut self) -> Result<RescoreSummary, WorkerError> {
        let ids: Vec<String> = self.index.ids().map(str::to_string).collect();
        let mut summary = RescoreSummary::default();

        for id in ids {
            let price = match self.quote_price(&id).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Failed to fetch price for {}: {}", id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let token = self
                .index
                .find(&id)
                .ok_or_else(|| IndexError::NotFound(id.clone()))?;

            let observation = match self.scorer.observe(token, price, self.maturity) {
                Ok(obs) => obs,
                Err(ScoreError::UninitializedPrice) => {
                    warn!("Token {} has no previous price, skipping", id);
                    summary.skipped += 1;
                    continue;
                }
            };

            let token = self.index.update(
                &id,
                observation.score,
                observation.price,
                observation.strikes,
            )?;
            debug!(
                "{} price {} (diff {}) score {:.2} strikes {} roi {:.2}%",
                token.symbol(),
                observation.price,
                observation.price_diff,
                observation.score,
                observation.strikes,
                token.roi_pct()
            );

            let token = self
                .index
                .find(&id)
                .ok_or_else(|| IndexError::NotFound(id.clone()))?;
            self.set.evaluate(token, &self.index, self.maturity, self.pass);
            summary.updated += 1;
        }

        self.index.log_ranking();
        Ok(summary)
    }

    /// Vet new members, then buy and sell to match the trading set
    async fn manage_holdings(&mut self) -> Result<(), WorkerError> {
        for id in self.set.member_ids() {
            if self.set.is_native(&id) {
                continue;
            }
            self.set
                .vet_candidate(
                    &mut self.index,
                    self.ports.vetter.as_ref(),
                    &id,
                    self.settings.call_timeout,
                )
                .await?;
        }

        let balances = match self.fetch_balances().await {
            Ok(balances) => balances,
            Err(e) => {
                warn!("Failed to fetch balances, skipping rebalance: {}", e);
                return Ok(());
            }
        };

        let plan = self.set.plan_rebalance(&self.index, &balances);
        if plan.is_empty() {
            debug!("Holdings match the trading set");
            return Ok(());
        }

        let native = self.chain.native_token.clone();
        for (id, amount) in &plan.to_sell {
            match self.swap(id, &native, *amount).await {
                Ok(receipt) => info!("Sold {} of {} ({})", amount, id, receipt.tx_hash),
                Err(e) => error!("Failed to sell {}: {}", id, e),
            }
        }
        for (id, amount) in &plan.to_buy {
            match self.swap(&native, id, *amount).await {
                Ok(receipt) => info!(
                    "Bought {} of {} for {} native ({})",
                    receipt.amount_out, id, amount, receipt.tx_hash
                ),
                Err(e) => error!("Failed to buy {}: {}", id, e),
            }
        }

        Ok(())
    }

    /// Liquidate into the stable token, clear the set and enter cooldown.
    ///
    /// Failed swaps are logged; the transition happens regardless.
    async fn fall_back_to_stable(&mut self, reason: FallbackReason) {
        warn!("Falling back to stable: {}", reason);

        match self.fetch_balances().await {
            Ok(balances) => {
                let stable = self.chain.stable_token.clone();
                for order in self.set.plan_fallback(&balances) {
                    match self.swap(&order.token_id, &stable, order.amount).await {
                        Ok(receipt) => info!(
                            "Liquidated {} of {} into {} stable ({})",
                            order.amount, order.token_id, receipt.amount_out, receipt.tx_hash
                        ),
                        Err(e) => error!("Failed to liquidate {}: {}", order.token_id, e),
                    }
                }
            }
            Err(e) => error!("Failed to fetch balances for liquidation: {}", e),
        }

        self.set.clear();
        self.transition(RunState::Cooldown {
            remaining_passes: self.settings.cooldown_passes.max(1),
        });
    }

    /// Close a cooldown cycle: widen the caps and give the native token a fresh start
    fn finish_cooldown(&mut self) -> Result<(), WorkerError> {
        self.maturity += 1;

        let native_price = self
            .index
            .find(&self.chain.native_token)
            .and_then(|t| t.last_price());
        if let Some(price) = native_price {
            self.index.update(
                &self.chain.native_token,
                self.scorer.initial_score(),
                price,
                0,
            )?;
        }

        info!("Cooldown complete, maturity now {}", self.maturity);
        self.transition(RunState::Bootstrapping);
        Ok(())
    }

    fn ready_to_manage(&self) -> bool {
        let params = self.set.params();
        let native_ready = self
            .index
            .find(&self.chain.native_token)
            .map(|t| t.score() > params.native_maturity_bar(self.maturity))
            .unwrap_or(false);

        self.set.len() >= params.min_set_size && native_ready
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(self.state.can_transition_to(&next));
        info!("{} -> {}", self.state, next);
        self.state = next;
    }

    /// Native for ordinary tokens, stable for the native token itself
    fn reference_for(&self, id: &str) -> (&str, u128) {
        if id == self.chain.native_token {
            (self.chain.stable_token.as_str(), self.settings.native_quote_amount)
        } else {
            (self.chain.native_token.as_str(), self.settings.quote_amount)
        }
    }

    async fn quote_price(&self, id: &str) -> Result<u128, OracleError> {
        let (reference, amount) = self.reference_for(id);
        let quote = self
            .call(self.ports.oracle.quote(id, reference, amount))
            .await
            .unwrap_or(Err(OracleError::Timeout))?;

        if quote.price() == 0 {
            return Err(OracleError::ParseError(format!("Zero price quoted for {}", id)));
        }
        Ok(quote.price())
    }

    async fn fetch_balances(&self) -> Result<HashMap<String, u128>, ExecutionError> {
        self.call(self.ports.wallet.balances())
            .await
            .unwrap_or(Err(ExecutionError::Timeout))
    }

    async fn swap(
        &self,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<SwapReceipt, ExecutionError> {
        self.call(self.ports.executor.swap(from, to, amount))
            .await
            .unwrap_or(Err(ExecutionError::Timeout))
    }

    /// Await an external call under `call_timeout`; `None` on timeout
    async fn call<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::time::timeout(self.settings.call_timeout, fut).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{CountingVetter, RecordingWallet, ScriptedOracle, StaticCatalog};
    use crate::ports::market_data::MockChainCatalog;
    use approx::assert_relative_eq;

    const NATIVE: &str = "0xnative";
    const STABLE: &str = "0xstable";

    fn chain() -> ChainSettings {
        ChainSettings {
            name: "polygon".to_string(),
            chain_id: 137,
            native_token: NATIVE.to_string(),
            stable_token: STABLE.to_string(),
        }
    }

    fn settings() -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(1),
            cooldown_passes: 2,
            call_timeout: Duration::from_millis(200),
            quote_amount: 1_000,
            native_quote_amount: 1_000,
        }
    }

    fn worker(oracle: ScriptedOracle, catalog: StaticCatalog) -> ChainWorker {
        let wallet = Arc::new(RecordingWallet::new());
        let ports = Collaborators {
            oracle: Arc::new(oracle),
            catalog: Arc::new(catalog),
            wallet: wallet.clone(),
            executor: wallet,
            vetter: Arc::new(CountingVetter::new()),
        };
        ChainWorker::new(
            chain(),
            settings(),
            ScoringParams::default(),
            TradingSetParams::default(),
            ports,
        )
    }

    #[tokio::test]
    async fn test_bootstrap_indexes_priced_tokens_and_native() {
        let oracle = ScriptedOracle::new()
            .with_prices("0xa", &[1000])
            .with_prices(NATIVE, &[500]);
        let catalog = StaticCatalog::new()
            .with_token("0xa", "AAA", 18)
            .with_token("0xb", "BBB", 18)
            .with_token(STABLE, "USDC", 6);
        let mut worker = worker(oracle, catalog);

        let state = worker.tick().await.unwrap();
        assert_eq!(state, RunState::Scouting);
        // 0xb has no price and the stable token is never ranked
        assert_eq!(worker.index().len(), 2);
        assert!(worker.index().contains(NATIVE));
        assert!(!worker.index().contains("0xb"));
        assert_eq!(worker.index().find("0xa").unwrap().score(), 1.0);
    }

    #[tokio::test]
    async fn test_bootstrap_without_native_price_stays() {
        let oracle = ScriptedOracle::new().with_prices("0xa", &[1000]);
        let catalog = StaticCatalog::new().with_token("0xa", "AAA", 18);
        let mut worker = worker(oracle, catalog);

        let err = worker.tick().await.unwrap_err();
        assert!(matches!(err, WorkerError::NativeUnavailable(_)));
        assert_eq!(worker.state(), RunState::Bootstrapping);
    }

    #[tokio::test]
    async fn test_catalog_failure_stays_bootstrapping() {
        let mut catalog = MockChainCatalog::new();
        catalog
            .expect_discover_tokens()
            .returning(|_| Err(OracleError::RestError("503".to_string())));

        let wallet = Arc::new(RecordingWallet::new());
        let ports = Collaborators {
            oracle: Arc::new(ScriptedOracle::new()),
            catalog: Arc::new(catalog),
            wallet: wallet.clone(),
            executor: wallet,
            vetter: Arc::new(CountingVetter::new()),
        };
        let mut worker = ChainWorker::new(
            chain(),
            settings(),
            ScoringParams::default(),
            TradingSetParams::default(),
            ports,
        );

        assert!(matches!(worker.tick().await, Err(WorkerError::Oracle(_))));
        assert_eq!(worker.state(), RunState::Bootstrapping);
    }

    #[tokio::test]
    async fn test_rescore_applies_drop() {
        let oracle = ScriptedOracle::new()
            .with_prices("0xa", &[1000, 950])
            .with_prices(NATIVE, &[500, 500]);
        let catalog = StaticCatalog::new().with_token("0xa", "AAA", 18);
        let mut worker = worker(oracle, catalog);

        worker.tick().await.unwrap();
        let summary = worker.rescore_all().await.unwrap();
        assert_eq!(summary, RescoreSummary { updated: 2, skipped: 0 });

        let token = worker.index().find("0xa").unwrap();
        assert_relative_eq!(token.score(), 7.0, epsilon = 1e-9);
        assert_eq!(token.strikes(), 0);
        assert_eq!(token.last_price(), Some(950));
        assert!(worker.trading_set().contains("0xa"));
    }

    #[tokio::test]
    async fn test_failed_quote_leaves_token_untouched() {
        let oracle = ScriptedOracle::new()
            .with_prices("0xa", &[1000])
            .with_prices(NATIVE, &[500]);
        oracle.push_failure("0xa", OracleError::RateLimited("429".to_string()));
        let catalog = StaticCatalog::new().with_token("0xa", "AAA", 18);
        let mut worker = worker(oracle, catalog);

        worker.tick().await.unwrap();
        let summary = worker.rescore_all().await.unwrap();
        assert_eq!(summary.skipped, 1);

        let token = worker.index().find("0xa").unwrap();
        assert_eq!(token.score(), 1.0);
        assert_eq!(token.last_price(), Some(1000));
    }

    #[tokio::test]
    async fn test_fallback_request_dropped_outside_managing() {
        let oracle = ScriptedOracle::new()
            .with_prices("0xa", &[1000])
            .with_prices(NATIVE, &[500]);
        let catalog = StaticCatalog::new().with_token("0xa", "AAA", 18);
        let mut worker = worker(oracle, catalog);

        worker.fallback_handle().request();
        assert_eq!(worker.tick().await.unwrap(), RunState::Scouting);
        // The request was consumed, not queued
        assert_eq!(worker.tick().await.unwrap(), RunState::Scouting);
        assert!(!worker.fallback.take());
    }

    #[tokio::test]
    async fn test_rebootstrap_refreshes_prices_only() {
        let oracle = ScriptedOracle::new()
            .with_prices("0xa", &[1000, 950])
            .with_prices(NATIVE, &[500, 500]);
        let catalog = StaticCatalog::new().with_token("0xa", "AAA", 18);
        let mut worker = worker(oracle.clone(), catalog);

        worker.tick().await.unwrap();
        worker.rescore_all().await.unwrap();

        oracle.push_price("0xa", 900);
        oracle.push_failure(NATIVE, OracleError::Timeout);
        assert_eq!(worker.initialize_tokens().await.unwrap(), 0);

        let token = worker.index().find("0xa").unwrap();
        assert_eq!(token.last_price(), Some(900));
        assert_relative_eq!(token.score(), 7.0, epsilon = 1e-9);
        assert_eq!(token.initial_price(), 1000);
        // A failed re-quote keeps the previous observation
        assert_eq!(worker.index().find(NATIVE).unwrap().last_price(), Some(500));
    }

    #[tokio::test]
    async fn test_status_reports_native_roi() {
        let oracle = ScriptedOracle::new().with_prices(NATIVE, &[500, 450]);
        let mut worker = worker(oracle, StaticCatalog::new());
        assert_eq!(worker.status().native_roi_pct, None);

        worker.tick().await.unwrap();
        worker.tick().await.unwrap();

        // 500 -> 450 units per reference amount is a 10% gain
        let roi = worker.status().native_roi_pct.unwrap();
        assert_relative_eq!(roi, 10.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let oracle = ScriptedOracle::new().with_prices(NATIVE, &[500]);
        let mut worker = worker(oracle, StaticCatalog::new());
        worker.tick().await.unwrap();

        let status = worker.status();
        assert_eq!(status.chain, "polygon");
        assert_eq!(status.state, RunState::Scouting);
        assert_eq!(status.pass, 1);
        assert_eq!(status.indexed_tokens, 1);
        assert_eq!(status.native_score, Some(1.0));
        assert_eq!(status.native_roi_pct, Some(0.0));
        assert!(status.members.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let oracle = ScriptedOracle::new().with_prices(NATIVE, &[500]);
        let mut worker = worker(oracle, StaticCatalog::new());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            worker.run(rx).await;
            worker
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let worker = handle.await.unwrap();
        assert!(worker.status().pass >= 1);
    }
}
