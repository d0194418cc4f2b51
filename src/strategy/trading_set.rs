//! Trading Set Controller
//!
//! Bounded working set of tokens the worker actively trades. Membership is
//! driven by the live token state in the [`RankedTokenIndex`]: the set only
//! stores ids plus admission bookkeeping.
//!
//! Rules:
//! - Admission: score above the maturity-scaled bar and strikes under the
//!   ceiling. The native token uses a lower bar and ignores strikes.
//! - Eviction: strikes over the ceiling or score under the floor. Never the
//!   native token.
//! - Capacity: enforced on every admission. The lowest-scoring non-native
//!   member goes first, ties by id.
//! - Vetting: one round-trip probe per token, ever.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::params::TradingSetParams;
use crate::domain::{IndexError, RankedTokenIndex, Token};
use crate::ports::TokenVetter;

/// Bookkeeping for one member
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Membership {
    /// Score at the moment of admission
    pub admitted_score: f64,
    /// Worker pass on which the token was admitted
    pub admitted_pass: u64,
}

/// Outcome of evaluating one token after a score update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admitted,
    Evicted,
    Unchanged,
}

/// Why the fallback to stable fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FallbackReason {
    NativeScoreFloor,
    NativeStrikeCeiling,
    Requested,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NativeScoreFloor => write!(f, "native score below floor"),
            FallbackReason::NativeStrikeCeiling => write!(f, "native strikes above ceiling"),
            FallbackReason::Requested => write!(f, "external request"),
        }
    }
}

/// Swaps needed to bring wallet holdings in line with the set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalancePlan {
    /// Members to buy with native, best score first, with the native amount to spend
    pub to_buy: Vec<(String, u128)>,
    /// Held non-members to convert back to native, with their full balance
    pub to_sell: Vec<(String, u128)>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.to_buy.is_empty() && self.to_sell.is_empty()
    }
}

/// One swap of the fallback liquidation into the stable token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationOrder {
    pub token_id: String,
    pub amount: u128,
}

/// Admission, eviction, vetting and fallback planning for one chain
#[derive(Debug)]
pub struct TradingSetController {
    params: TradingSetParams,
    native_id: String,
    stable_id: String,
    members: BTreeMap<String, Membership>,
}

impl TradingSetController {
    pub fn new(
        params: TradingSetParams,
        native_id: impl Into<String>,
        stable_id: impl Into<String>,
    ) -> Self {
        Self {
            params,
            native_id: native_id.into(),
            stable_id: stable_id.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &TradingSetParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn membership(&self, id: &str) -> Option<&Membership> {
        self.members.get(id)
    }

    /// Member ids in lexicographic order
    pub fn member_ids(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    pub fn is_native(&self, id: &str) -> bool {
        id == self.native_id
    }

    /// Apply the admission and eviction rules to a freshly scored token.
    ///
    /// An admission that overflows `max_size` is trimmed right away against
    /// the current index scores. If the newcomer itself is the weakest, it is
    /// displaced again and the verdict is `Unchanged`.
    pub fn evaluate(
        &mut self,
        token: &Token,
        index: &RankedTokenIndex,
        maturity: u32,
        pass: u64,
    ) -> Verdict {
        let id = token.id();
        let native = self.is_native(id);

        if self.members.contains_key(id) {
            if native {
                return Verdict::Unchanged;
            }
            if token.strikes() > self.params.strike_ceiling
                || token.score() < self.params.score_floor
            {
                if let Some(membership) = self.members.remove(id) {
                    info!(
                        "Evicted {} (score {:.2}, strikes {}; admitted at {:.2} on pass {})",
                        token.symbol(),
                        token.score(),
                        token.strikes(),
                        membership.admitted_score,
                        membership.admitted_pass
                    );
                }
                return Verdict::Evicted;
            }
            return Verdict::Unchanged;
        }

        let eligible = if native {
            token.score() > self.params.native_admission_bar(maturity)
        } else {
            // A token that already failed vetting never comes back
            let rejected = token.is_tested() && !token.is_whitelisted();
            token.score() > self.params.admission_bar(maturity)
                && token.strikes() < self.params.strike_ceiling
                && !rejected
        };

        if !eligible {
            return Verdict::Unchanged;
        }

        self.members.insert(
            id.to_string(),
            Membership {
                admitted_score: token.score(),
                admitted_pass: pass,
            },
        );

        let evicted = self.trim_to_capacity(|member| {
            if member == id {
                Some(token.score())
            } else {
                index.find(member).map(|t| t.score())
            }
        });
        if evicted.iter().any(|e| e == id) {
            debug!(
                "{} (score {:.2}) is the weakest candidate of a full set, not admitted",
                token.symbol(),
                token.score()
            );
            return Verdict::Unchanged;
        }

        info!("Admitted {} (score {:.2})", token.symbol(), token.score());
        Verdict::Admitted
    }

    /// Evict lowest-scoring non-native members until the set fits `max_size`.
    ///
    /// Returns the evicted ids in eviction order.
    fn trim_to_capacity<F>(&mut self, score_of: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let mut evicted = Vec::new();

        while self.members.len() > self.params.max_size {
            let victim = self
                .members
                .keys()
                .filter(|id| !self.is_native(id))
                .map(|id| (score_of(id).unwrap_or(f64::NEG_INFINITY), id.clone()))
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

            let Some((score, id)) = victim else {
                break;
            };

            if let Some(membership) = self.members.remove(&id) {
                debug!(
                    "Capacity eviction of {} (score {:.2}; admitted at {:.2} on pass {})",
                    id, score, membership.admitted_score, membership.admitted_pass
                );
            }
            evicted.push(id);
        }

        evicted
    }

    /// Drop a member whose token left the index
    pub fn on_index_removal(&mut self, id: &str) -> bool {
        self.members.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Run the one-shot liquidity probe for a candidate.
    ///
    /// Returns whether the token is whitelisted. The probe runs at most once per
    /// token: any outcome, including a failed or timed out probe, marks it tested.
    /// A rejected candidate leaves the set.
    pub async fn vet_candidate<V: TokenVetter + ?Sized>(
        &mut self,
        index: &mut RankedTokenIndex,
        vetter: &V,
        id: &str,
        call_timeout: Duration,
    ) -> Result<bool, IndexError> {
        if self.is_native(id) {
            return Ok(true);
        }

        let token = index
            .find(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        if token.is_tested() {
            return Ok(token.is_whitelisted());
        }
        let symbol = token.symbol().to_string();

        let probe = tokio::time::timeout(
            call_timeout,
            vetter.probe(id, &self.native_id, self.params.probe_amount),
        )
        .await;

        let whitelisted = match probe {
            Ok(Ok(round_trip)) => {
                let ok = !round_trip.exceeds_loss(self.params.max_round_trip_loss_bps);
                info!(
                    "Vetted {}: round-trip loss {} bps, {}",
                    symbol,
                    round_trip.loss_bps(),
                    if ok { "whitelisted" } else { "rejected" }
                );
                ok
            }
            Ok(Err(e)) => {
                warn!("Vetting probe for {} failed: {}", symbol, e);
                false
            }
            Err(_) => {
                warn!("Vetting probe for {} timed out", symbol);
                false
            }
        };

        index.record_vetting(id, whitelisted)?;
        if !whitelisted {
            self.members.remove(id);
        }
        Ok(whitelisted)
    }

    /// Compare members against wallet holdings.
    ///
    /// Only vetted members are bought, best score first, each spending
    /// `buy_amount` of native as long as the native reserve stays intact.
    pub fn plan_rebalance(
        &self,
        index: &RankedTokenIndex,
        balances: &HashMap<String, u128>,
    ) -> RebalancePlan {
        let held = |id: &str| balances.get(id).copied().unwrap_or(0) > 0;

        let mut candidates: Vec<&Token> = self
            .members
            .keys()
            .filter(|id| !self.is_native(id) && **id != self.stable_id && !held(id.as_str()))
            .filter_map(|id| index.find(id))
            .filter(|t| t.is_whitelisted())
            .collect();
        candidates.sort_by(|a, b| {
            b.score()
                .total_cmp(&a.score())
                .then_with(|| a.id().cmp(b.id()))
        });

        let mut native_left = balances.get(&self.native_id).copied().unwrap_or(0);
        let mut to_buy = Vec::new();
        for token in candidates {
            let after = native_left.saturating_sub(self.params.buy_amount);
            if native_left < self.params.buy_amount || after < self.params.native_reserve {
                debug!("Native reserve reached, deferring remaining buys");
                break;
            }
            native_left = after;
            to_buy.push((token.id().to_string(), self.params.buy_amount));
        }

        let mut to_sell: Vec<(String, u128)> = balances
            .iter()
            .filter(|(id, amount)| {
                **amount > 0
                    && !self.is_native(id)
                    && **id != self.stable_id
                    && !self.members.contains_key(*id)
            })
            .map(|(id, amount)| (id.clone(), *amount))
            .collect();
        to_sell.sort();

        RebalancePlan { to_buy, to_sell }
    }

    /// Check the native token for a fallback trigger
    pub fn native_distress(&self, native: &Token) -> Option<FallbackReason> {
        if native.score() < self.params.native_score_floor {
            Some(FallbackReason::NativeScoreFloor)
        } else if native.strikes() > self.params.native_strike_ceiling {
            Some(FallbackReason::NativeStrikeCeiling)
        } else {
            None
        }
    }

    /// Swaps that move every non-stable holding into the stable token.
    ///
    /// The native token is only partially converted: `native_liquidation_pct`
    /// of the balance above `native_reserve`.
    pub fn plan_fallback(&self, balances: &HashMap<String, u128>) -> Vec<LiquidationOrder> {
        let mut orders: Vec<LiquidationOrder> = balances
            .iter()
            .filter(|(id, _)| **id != self.stable_id)
            .filter_map(|(id, balance)| {
                let amount = if self.is_native(id) {
                    let above = balance.saturating_sub(self.params.native_reserve);
                    above / 100 * self.params.native_liquidation_pct as u128
                        + above % 100 * self.params.native_liquidation_pct as u128 / 100
                } else {
                    *balance
                };
                (amount > 0).then(|| LiquidationOrder {
                    token_id: id.clone(),
                    amount,
                })
            })
            .collect();
        orders.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        orders
    }
}
