pub mod config;
pub mod counters;
pub mod error;
pub mod filters;
pub mod hashing;
pub mod parallel_counting;
pub mod serialization;
pub mod storage;

pub use counters::Counter;
pub use counters::EstimateRegime;
pub use counters::ExactCounter;
pub use counters::HyperLogLogCounter;
pub use error::{Result, SketchError};
pub use filters::BloomFilter;
pub use filters::{PasswordStatus, PasswordUniquenessChecker};
pub use hashing::HashFamily;
