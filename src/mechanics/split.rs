//! Allocation arithmetic for the continuous-split games.

/// Dictator keeps what they don't give away.
#[inline]
pub fn dictator_keep(pot: f64, given: f64) -> f64 {
    pot - given
}

/// Ultimatum: (proposer, responder) payoffs for an offer of `offer` out of `pot`.
#[inline]
pub fn ultimatum(pot: f64, offer: f64, accepted: bool) -> (f64, f64) {
    if accepted { (pot - offer, offer) } else { (0.0, 0.0) }
}

/// Trust: (investor profit, trustee profit). The investment is multiplied
/// before the trustee decides how much to send back.
#[inline]
pub fn trust(invested: f64, multiplier: f64, returned: f64) -> (f64, f64) {
    (returned - invested, invested * multiplier - returned)
}

/// Public goods: equal share of the multiplied pool.
#[inline]
pub fn public_goods_share(total_contributions: f64, multiplier: f64, players: usize) -> f64 {
    total_contributions * multiplier / players.max(1) as f64
}

/// Third-party punishment: (punisher cost, allocator loss).
#[inline]
pub fn punishment(points: f64, cost_per_point: f64, impact_per_point: f64) -> (f64, f64) {
    (points * cost_per_point, points * impact_per_point)
}

/// `fraction` of `amount`, rounded to whole points.
#[inline]
pub fn rounded_share(amount: f64, fraction: f64) -> f64 {
    (fraction * amount).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_identities() {
        assert_eq!(dictator_keep(100.0, 30.0), 70.0);
        assert_eq!(ultimatum(100.0, 40.0, true), (60.0, 40.0));
        assert_eq!(ultimatum(100.0, 40.0, false), (0.0, 0.0));
        assert_eq!(trust(50.0, 3.0, 75.0), (25.0, 75.0));
        assert_eq!(public_goods_share(200.0, 2.0, 4), 100.0);
        assert_eq!(punishment(10.0, 1.0, 3.0), (10.0, 30.0));
    }
}
