//! Closed-form behavioral indices.
//!
//! These are the simplified estimators reported in exports, not fitted
//! models. Degenerate values (division by zero, infinities) are dropped
//! before averaging rather than repaired.

use super::stats;

/// Hyperbolic discount rate implied by preferring `immediate` now over
/// `delayed` after `delay` units: `k = (A/V - 1) / D`.
#[inline]
pub fn hyperbolic_k(delayed: f64, immediate: f64, delay: f64) -> f64 {
    (delayed / immediate - 1.0) / delay
}

/// Mean of the finite `k` values; `None` when nothing survives the filter.
pub fn mean_finite(ks: impl IntoIterator<Item = f64>) -> Option<f64> {
    let kept: Vec<f64> = ks.into_iter().filter(|k| k.is_finite()).collect();
    stats::mean(&kept)
}

/// Social discount rate at one distance from the share of altruistic
/// (delayed-option) choices there. Rate 1 maps to 0, rate 0 to infinity.
#[inline]
pub fn social_k(altruistic_rate: f64, distance: f64) -> f64 {
    if altruistic_rate >= 1.0 {
        0.0
    } else if altruistic_rate <= 0.0 {
        f64::INFINITY
    } else {
        (1.0 / altruistic_rate - 1.0) / distance
    }
}

/// `1 - |a - T/2| / (T/2)`: 1 for an even split, 0 at either extreme.
#[inline]
pub fn fairness(allocation: f64, pot: f64) -> f64 {
    let half = pot / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    1.0 - (allocation - half).abs() / half
}

/// Framing effect: risk seeking under losses minus risk seeking under gains.
#[inline]
pub fn framing_effect(loss_risky_rate: f64, gain_risky_rate: f64) -> f64 {
    loss_risky_rate - gain_risky_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperbolic_k_matches_formula() {
        // 500 now vs 1000 in 100 days → (2 - 1) / 100
        assert!((hyperbolic_k(1000.0, 500.0, 100.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn non_finite_values_are_dropped() {
        assert_eq!(mean_finite([f64::INFINITY, f64::NAN]), None);
        assert_eq!(mean_finite([0.5, f64::INFINITY, 1.5]), Some(1.0));
    }

    #[test]
    fn social_k_corners() {
        assert_eq!(social_k(1.0, 10.0), 0.0);
        assert!(social_k(0.0, 10.0).is_infinite());
        assert!((social_k(0.5, 2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fairness_is_one_at_even_split() {
        assert_eq!(fairness(50.0, 100.0), 1.0);
        assert_eq!(fairness(0.0, 100.0), 0.0);
        assert_eq!(fairness(100.0, 100.0), 0.0);
        assert_eq!(fairness(30.0, 100.0), 0.6);
    }
}
