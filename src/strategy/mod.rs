//! Strategy Layer - Momentum scoring and trading-set management
//!
//! - `momentum`: pure price-move to score-delta mapping plus the strike policy
//! - `trading_set`: admission, eviction, capacity, vetting and fallback planning
//! - `params`: tunables for both, loaded from the `[scoring]` and
//!   `[trading_set]` config sections

pub mod params;
pub mod momentum;
pub mod trading_set;

pub use params::{ParamsError, ScoringParams, TradingSetParams};
pub use momentum::{MomentumScorer, Observation, ScoreError};
pub use trading_set::{
    FallbackReason, LiquidationOrder, Membership, RebalancePlan, TradingSetController, Verdict,
};
