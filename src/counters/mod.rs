pub mod counter_base;
pub mod exact_counter;
pub mod hll_counter;

pub use counter_base::Counter;
pub use exact_counter::ExactCounter;
pub use hll_counter::{EstimateRegime, HyperLogLogCounter};
