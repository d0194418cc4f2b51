//! Momentum Scorer
//!
//! Maps a price observation to a score delta and a strike update. Prices are
//! "units of token received per reference amount": a rise means the token got
//! cheaper, which is unfavorable and lowers its score.
//!
//! Everything here is pure: identical inputs always give identical outputs.

use thiserror::Error;

use super::params::ScoringParams;
use crate::domain::Token;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The token has never been priced; skip it for this round
    #[error("No previous price to compare against")]
    UninitializedPrice,
}

/// Outcome of one observation, ready to be written to the index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub price: u128,
    pub price_diff: i128,
    pub delta: f64,
    pub score: f64,
    pub strikes: u32,
}

/// Score delta for a price move, clamped to `[-cap, cap]`.
///
/// Positive deltas are unfavorable; callers subtract the delta from the score.
pub fn score_delta(
    price_diff: i128,
    last_price: u128,
    cap: f64,
    params: &ScoringParams,
) -> Result<f64, ScoreError> {
    if last_price == 0 {
        return Err(ScoreError::UninitializedPrice);
    }

    let pct = price_diff as f64 / last_price as f64 * 100.0;

    let delta = if pct > 0.0 {
        let mut d = pct * params.rise_multiplier;
        if pct > params.rise_bonus_threshold_pct {
            d += params.rise_bonus;
        }
        d
    } else {
        pct * params.fall_multiplier
    };

    Ok(delta.clamp(-cap, cap))
}

/// Strike counter after a price move: +1 on a rise, -2 (floored at 0) on a fall
pub fn next_strikes(price_diff: i128, strikes: u32) -> u32 {
    if price_diff > 0 {
        strikes.saturating_add(1)
    } else if price_diff < 0 {
        strikes.saturating_sub(2)
    } else {
        strikes
    }
}

/// Signed difference between two unsigned prices
pub fn price_diff(current: u128, last: u128) -> i128 {
    if current >= last {
        i128::try_from(current - last).unwrap_or(i128::MAX)
    } else {
        i128::try_from(last - current).map(|d| -d).unwrap_or(i128::MIN)
    }
}

/// Stateless scorer bound to a parameter set
#[derive(Debug, Clone, Default)]
pub struct MomentumScorer {
    params: ScoringParams,
}

impl MomentumScorer {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn cap(&self, maturity: u32) -> f64 {
        self.params.cap(maturity)
    }

    pub fn initial_score(&self) -> f64 {
        self.params.initial_score
    }

    /// Score a new price for `token` without mutating it
    pub fn observe(
        &self,
        token: &Token,
        current_price: u128,
        maturity: u32,
    ) -> Result<Observation, ScoreError> {
        let last = match token.last_price() {
            Some(p) if p > 0 => p,
            _ => return Err(ScoreError::UninitializedPrice),
        };

        let diff = price_diff(current_price, last);
        let delta = score_delta(diff, last, self.cap(maturity), &self.params)?;

        Ok(Observation {
            price: current_price,
            price_diff: diff,
            delta,
            score: token.score() - delta,
            strikes: next_strikes(diff, token.strikes()),
        })
    }
}
