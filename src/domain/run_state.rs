//! Chain Run State
//!
//! The per-chain lifecycle. A single enum replaces the loose collection of
//! "swapped to stable" / "manage" flags, so no ambiguous combination exists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Token discovery in progress
    Bootstrapping,
    /// Accumulating score history, trading set not yet confident enough
    Scouting,
    /// Actively rebalancing against wallet holdings
    Managing,
    /// Flat in the stable token, dormant for the remaining number of polls
    Cooldown { remaining_passes: u32 },
}

impl RunState {
    /// Whether a transition from `self` to `next` is legal
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Bootstrapping, Scouting) => true,
            (Scouting, Scouting) | (Scouting, Managing) => true,
            (Managing, Managing) | (Managing, Cooldown { .. }) => true,
            (Cooldown { .. }, Cooldown { .. }) | (Cooldown { .. }, Bootstrapping) => true,
            _ => false,
        }
    }

    /// Explicit fallback requests only apply while managing
    pub fn accepts_fallback(&self) -> bool {
        matches!(self, RunState::Managing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunState::Bootstrapping => "bootstrapping",
            RunState::Scouting => "scouting",
            RunState::Managing => "managing",
            RunState::Cooldown { .. } => "cooldown",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Cooldown { remaining_passes } => {
                write!(f, "cooldown ({} passes left)", remaining_passes)
            }
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use RunState::*;
        let cooldown = Cooldown { remaining_passes: 3 };
        assert!(Bootstrapping.can_transition_to(&Scouting));
        assert!(Scouting.can_transition_to(&Scouting));
        assert!(Scouting.can_transition_to(&Managing));
        assert!(Managing.can_transition_to(&Managing));
        assert!(Managing.can_transition_to(&cooldown));
        assert!(cooldown.can_transition_to(&Bootstrapping));
    }

    #[test]
    fn test_illegal_transitions() {
        use RunState::*;
        let cooldown = Cooldown { remaining_passes: 3 };
        assert!(!Bootstrapping.can_transition_to(&Managing));
        assert!(!Scouting.can_transition_to(&cooldown));
        assert!(!Managing.can_transition_to(&Scouting));
        assert!(!cooldown.can_transition_to(&Managing));
        assert!(!Bootstrapping.can_transition_to(&Bootstrapping));
    }

    #[test]
    fn test_fallback_only_while_managing() {
        assert!(RunState::Managing.accepts_fallback());
        assert!(!RunState::Scouting.accepts_fallback());
        assert!(!RunState::Bootstrapping.accepts_fallback());
        assert!(!RunState::Cooldown { remaining_passes: 1 }.accepts_fallback());
    }

    #[test]
    fn test_display() {
        assert_eq!(RunState::Managing.to_string(), "managing");
        assert_eq!(
            RunState::Cooldown { remaining_passes: 2 }.to_string(),
            "cooldown (2 passes left)"
        );
    }
}
