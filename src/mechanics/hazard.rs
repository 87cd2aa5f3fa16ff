//! Balloon pump hazard.
//!
//! The chance that the next pump pops is `1 / (max_pumps - pumps)`, so the
//! pop point is uniform over `1..=max_pumps` and the last pump always pops.

use rand_core::RngCore;

use super::stoch;

/// Probability that the next pump pops the balloon.
#[inline]
pub fn pop_probability(max_pumps: u32, pumps: u32) -> f64 {
    if pumps + 1 >= max_pumps {
        1.0
    } else {
        1.0 / f64::from(max_pumps - pumps)
    }
}

/// Draw one pump. `true` means the balloon popped.
#[inline]
pub fn pump<R: RngCore + ?Sized>(rng: &mut R, max_pumps: u32, pumps: u32) -> bool {
    stoch::bernoulli(rng, pop_probability(max_pumps, pumps))
}

/// Successful pumps before the pop when the participant never collects.
pub fn pumps_until_pop<R: RngCore + ?Sized>(rng: &mut R, max_pumps: u32) -> u32 {
    let mut pumps = 0;
    while !pump(rng, max_pumps, pumps) {
        pumps += 1;
    }
    pumps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn hazard_rises_to_certainty() {
        assert_eq!(pop_probability(8, 0), 0.125);
        assert_eq!(pop_probability(8, 4), 0.25);
        assert_eq!(pop_probability(8, 7), 1.0);
    }

    #[test]
    fn pop_point_is_uniform() {
        let mut rng = seeded_rng(42);
        let mut counts = [0u32; 8];
        for _ in 0..40_000 {
            let k = pumps_until_pop(&mut rng, 8) as usize;
            counts[k] += 1;
        }
        for c in counts {
            assert!((4_400..5_600).contains(&c), "bucket {c}");
        }
    }
}
