//! Survival-curve engine: discounted decrement curves, joint-life
//! recursion, snapshot caching, and Monte Carlo realization sampling

mod cache;
mod curve;
mod joint;
mod sampler;

pub use cache::{build_stats, StatsCache};
pub use curve::{compute_alive_dying, VitalStats};
pub use joint::couple_death;
pub use sampler::{joint_realization, sample_death};
