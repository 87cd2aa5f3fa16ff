// Pure building blocks shared by the experiment systems.

pub mod control;
pub mod discount;
pub mod hazard;
pub mod payoff;
pub mod split;
pub mod stats;
pub mod stoch;

pub use control::*;
pub use stoch::*;
