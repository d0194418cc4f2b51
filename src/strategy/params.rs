//! Strategy Parameters
//!
//! Configuration structs for momentum scoring and trading-set management.
//! Defaults are the empirically tuned reference values; treat them as
//! tunables rather than validated invariants.

use serde::{Deserialize, Serialize};

/// Momentum scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Score assigned to a newly discovered token
    pub initial_score: f64,
    /// Multiplier applied to a price rise (unfavorable move)
    pub rise_multiplier: f64,
    /// Multiplier applied to a price fall or hold (favorable move)
    pub fall_multiplier: f64,
    /// Flat penalty added to large rises
    pub rise_bonus: f64,
    /// Rise percentage above which the flat penalty applies
    pub rise_bonus_threshold_pct: f64,
    /// Per-round clamp at maturity 0
    pub base_cap: f64,
    /// Clamp growth per completed cooldown cycle
    pub cap_step: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            initial_score: 1.0,
            rise_multiplier: 1.5,
            fall_multiplier: 1.2,
            rise_bonus: 1.0,
            rise_bonus_threshold_pct: 1.0,
            base_cap: 10.0,
            cap_step: 5.0,
        }
    }
}

impl ScoringParams {
    /// Per-round score clamp after `maturity` cooldown cycles
    pub fn cap(&self, maturity: u32) -> f64 {
        self.base_cap + self.cap_step * maturity as f64
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.rise_multiplier <= 0.0 || self.fall_multiplier <= 0.0 {
            return Err(ParamsError::InvalidMultiplier(
                self.rise_multiplier.min(self.fall_multiplier),
            ));
        }
        if self.base_cap <= 0.0 {
            return Err(ParamsError::InvalidCap(self.base_cap));
        }
        if self.cap_step < 0.0 {
            return Err(ParamsError::InvalidCap(self.cap_step));
        }
        Ok(())
    }
}

/// Trading-set admission, eviction, vetting and fallback parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSetParams {
    /// Maximum number of members
    pub max_size: usize,
    /// Members required before leaving the scouting phase
    pub min_set_size: usize,
    /// Admission bar for ordinary tokens at maturity 0
    pub admission_score: f64,
    /// Relaxed admission bar for the native token at maturity 0
    pub native_admission_score: f64,
    /// Native score bar for leaving the scouting phase at maturity 0
    pub native_maturity_score: f64,
    /// Growth of every maturity-scaled bar per cooldown cycle
    pub maturity_step: f64,
    /// Strikes above this evict a member; admission requires fewer
    pub strike_ceiling: u32,
    /// Members scoring below this are evicted
    pub score_floor: f64,
    /// Native score below this triggers the fallback to stable
    pub native_score_floor: f64,
    /// Native strikes above this trigger the fallback to stable
    pub native_strike_ceiling: u32,
    /// Maximum tolerated round-trip loss of the liquidity probe, in basis points
    pub max_round_trip_loss_bps: u32,
    /// Amount of the reference token spent by the liquidity probe
    pub probe_amount: u128,
    /// Amount of native token spent per admission buy
    pub buy_amount: u128,
    /// Native balance that is never sold, kept for gas
    pub native_reserve: u128,
    /// Share of the native balance above the reserve converted on fallback
    pub native_liquidation_pct: u8,
}

impl Default for TradingSetParams {
    fn default() -> Self {
        Self {
            max_size: 6,
            min_set_size: 3,
            admission_score: 5.0,
            native_admission_score: 1.0,
            native_maturity_score: 3.0,
            maturity_step: 1.0,
            strike_ceiling: 2,
            score_floor: 0.0,
            native_score_floor: -5.0,
            native_strike_ceiling: 7,
            max_round_trip_loss_bps: 80, // 0.8%
            probe_amount: 10u128.pow(15),
            buy_amount: 10u128.pow(17),
            native_reserve: 10u128.pow(18),
            native_liquidation_pct: 90,
        }
    }
}

impl TradingSetParams {
    /// Admission bar for ordinary tokens after `maturity` cooldown cycles
    pub fn admission_bar(&self, maturity: u32) -> f64 {
        self.admission_score + self.maturity_step * maturity as f64
    }

    /// Admission bar for the native token after `maturity` cooldown cycles
    pub fn native_admission_bar(&self, maturity: u32) -> f64 {
        self.native_admission_score + self.maturity_step * maturity as f64
    }

    /// Native score required to move from scouting to managing
    pub fn native_maturity_bar(&self, maturity: u32) -> f64 {
        self.native_maturity_score + self.maturity_step * maturity as f64
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_size == 0 {
            return Err(ParamsError::InvalidSetSize(self.max_size));
        }
        if self.min_set_size > self.max_size {
            return Err(ParamsError::InvalidSetSize(self.min_set_size));
        }
        if self.native_admission_score > self.admission_score {
            return Err(ParamsError::InvalidThreshold(self.native_admission_score));
        }
        if self.score_floor >= self.admission_score {
            return Err(ParamsError::InvalidThreshold(self.score_floor));
        }
        if self.max_round_trip_loss_bps >= 10_000 {
            return Err(ParamsError::InvalidLossTolerance(self.max_round_trip_loss_bps));
        }
        if self.native_liquidation_pct > 100 {
            return Err(ParamsError::InvalidLiquidationPct(self.native_liquidation_pct));
        }
        if self.probe_amount == 0 || self.buy_amount == 0 {
            return Err(ParamsError::InvalidAmount);
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid score multiplier: {0} (must be > 0)")]
    InvalidMultiplier(f64),
    #[error("Invalid score cap: {0}")]
    InvalidCap(f64),
    #[error("Invalid trading set size: {0}")]
    InvalidSetSize(usize),
    #[error("Invalid score threshold: {0}")]
    InvalidThreshold(f64),
    #[error("Invalid round-trip loss tolerance: {0} bps (must be < 10000)")]
    InvalidLossTolerance(u32),
    #[error("Invalid native liquidation share: {0}% (must be <= 100)")]
    InvalidLiquidationPct(u8),
    #[error("Probe and buy amounts must be non-zero")]
    InvalidAmount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(ScoringParams::default().validate().is_ok());
        assert!(TradingSetParams::default().validate().is_ok());
    }

    #[test]
    fn test_cap_grows_with_maturity() {
        let params = ScoringParams::default();
        assert_eq!(params.cap(0), 10.0);
        assert_eq!(params.cap(2), 20.0);
    }

    #[test]
    fn test_bars_scale_with_maturity() {
        let params = TradingSetParams::default();
        assert_eq!(params.admission_bar(0), 5.0);
        assert_eq!(params.admission_bar(3), 8.0);
        assert!(params.native_admission_bar(3) < params.admission_bar(3));
        assert_eq!(params.native_maturity_bar(1), 4.0);
    }

    #[test]
    fn test_invalid_set_sizes() {
        let mut params = TradingSetParams::default();
        params.max_size = 0;
        assert!(matches!(params.validate(), Err(ParamsError::InvalidSetSize(0))));

        let mut params = TradingSetParams::default();
        params.min_set_size = 10;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_loss_tolerance() {
        let mut params = TradingSetParams::default();
        params.max_round_trip_loss_bps = 10_000;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidLossTolerance(10_000))
        ));
    }

    #[test]
    fn test_invalid_scoring_cap() {
        let mut params = ScoringParams::default();
        params.base_cap = 0.0;
        assert!(matches!(params.validate(), Err(ParamsError::InvalidCap(_))));
    }
}
