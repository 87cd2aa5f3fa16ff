//! Two-player, two-action payoff matrices (row player's payoff).
//!
//! Action 0 is the "primary" move of each game (cooperate, continue, stag),
//! action 1 the alternative (defect, swerve, hare).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    /// `cells[player][counterpart]`
    pub cells: [[f64; 2]; 2],
}

impl PayoffMatrix {
    /// Build from the four named outcomes.
    /// `both_primary`, `both_alt`, `alt_vs_primary` (player alt, counterpart primary),
    /// `primary_vs_alt` (player primary, counterpart alt).
    pub const fn new(both_primary: f64, both_alt: f64, alt_vs_primary: f64, primary_vs_alt: f64) -> Self {
        Self {
            cells: [[both_primary, primary_vs_alt], [alt_vs_primary, both_alt]],
        }
    }

    #[inline]
    pub fn payoff(&self, player_primary: bool, counterpart_primary: bool) -> f64 {
        self.cells[usize::from(!player_primary)][usize::from(!counterpart_primary)]
    }
}

/// Cooperate/defect: mutual cooperation 30, mutual defection -10,
/// defecting on a cooperator 50, cooperating with a defector -30.
pub const PRISONERS_DILEMMA: PayoffMatrix = PayoffMatrix::new(30.0, -10.0, 50.0, -30.0);

/// Continue/swerve: crash -50, both swerve 0, win 100, chicken -10.
pub const CHICKEN: PayoffMatrix = PayoffMatrix::new(-50.0, 0.0, -10.0, 100.0);

/// Stag/hare: joint stag 100, hares 30 regardless of the partner, lone stag 0.
pub const STAG_HUNT: PayoffMatrix = PayoffMatrix::new(100.0, 30.0, 30.0, 0.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prisoners_dilemma_cells() {
        let m = PRISONERS_DILEMMA;
        assert_eq!(m.payoff(true, true), 30.0);
        assert_eq!(m.payoff(false, false), -10.0);
        assert_eq!(m.payoff(false, true), 50.0);
        assert_eq!(m.payoff(true, false), -30.0);
    }

    #[test]
    fn chicken_and_stag_cells() {
        assert_eq!(CHICKEN.payoff(true, true), -50.0);
        assert_eq!(CHICKEN.payoff(false, false), 0.0);
        assert_eq!(CHICKEN.payoff(true, false), 100.0);
        assert_eq!(CHICKEN.payoff(false, true), -10.0);

        assert_eq!(STAG_HUNT.payoff(true, true), 100.0);
        assert_eq!(STAG_HUNT.payoff(false, false), 30.0);
        assert_eq!(STAG_HUNT.payoff(true, false), 0.0);
        assert_eq!(STAG_HUNT.payoff(false, true), 30.0);
    }
}
