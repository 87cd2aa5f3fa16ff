//! Control mechanics: clamped linear adjustments used by adaptive opponents
//! and bounded random walks.

/// Linear response: clamp(base + slope * x, lo, hi).
#[inline]
pub fn linear(base: f64, slope: f64, x: f64, lo: f64, hi: f64) -> f64 {
    (base + slope * x).clamp(lo, hi)
}

/// Probability that reacts linearly to an observed rate, clamped to [0, 1].
#[inline]
pub fn adaptive_probability(base: f64, slope: f64, rate: f64) -> f64 {
    linear(base, slope, rate, 0.0, 1.0)
}

/// One bounded random-walk step: clamp(x + step, lo, hi).
#[inline]
pub fn drift(x: f64, step: f64, lo: f64, hi: f64) -> f64 {
    (x + step).clamp(lo, hi)
}

/// Fraction of `items` satisfying `pred`; `empty` when there are none.
#[inline]
pub fn rate_of<T>(items: &[T], empty: f64, pred: impl Fn(&T) -> bool) -> f64 {
    if items.is_empty() {
        empty
    } else {
        items.iter().filter(|x| pred(x)).count() as f64 / items.len() as f64
    }
}
