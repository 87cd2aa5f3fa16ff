//! Stochastic mechanics: uniform/Bernoulli/Gaussian draws and shuffles.
//! Every helper takes the RNG explicitly so runs replay from a seed.
use rand_core::RngCore;

/// Uniform [0, 1) with 53 bits of mantissa.
#[inline]
pub fn uniform01<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform [lo, hi).
#[inline]
pub fn uniform<R: RngCore + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + uniform01(rng) * (hi - lo)
}

/// Symmetric noise in [-half_width, half_width).
#[inline]
pub fn jitter<R: RngCore + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    (uniform01(rng) - 0.5) * 2.0 * half_width
}

/// Uniform index in 0..n. `n` must be non-zero.
#[inline]
pub fn index<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> usize {
    debug_assert!(n > 0);
    ((uniform01(rng) * n as f64) as usize).min(n.saturating_sub(1))
}

/// Bernoulli(p), `p` clamped to [0, 1]. `p = 1` always succeeds.
#[inline]
pub fn bernoulli<R: RngCore + ?Sized>(rng: &mut R, p: f64) -> bool {
    uniform01(rng) < p.clamp(0.0, 1.0)
}

/// Gaussian(0,1) via Box–Muller.
#[inline]
pub fn gaussian01<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln finite.
    let u1 = 1.0 - uniform01(rng);
    let u2 = uniform01(rng);
    let r = (-2.0 * u1.ln()).sqrt();
    let t = 2.0 * std::f64::consts::PI * u2;
    r * t.cos()
}

/// Gaussian(mean, sd).
#[inline]
pub fn gaussian<R: RngCore + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    mean + sd * gaussian01(rng)
}

/// Approximate Gaussian(0,1) as the Irwin–Hall sum of twelve uniforms minus six.
#[inline]
pub fn irwin_hall12<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    (0..12).map(|_| uniform01(rng)).sum::<f64>() - 6.0
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T, R: RngCore + ?Sized>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = index(rng, i + 1);
        items.swap(i, j);
    }
}

/// Sample an index from non-negative weights by inverse CDF.
/// Falls back to the last index when rounding leaves the draw above the total.
pub fn weighted_index<R: RngCore + ?Sized>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() {
        return 0;
    }
    let u = uniform01(rng) * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if u <= acc {
            return i;
        }
    }
    weights.len() - 1
}
