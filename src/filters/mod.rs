pub mod bloom_filter;
pub mod password_checker;

pub use bloom_filter::BloomFilter;
pub use password_checker::{PasswordStatus, PasswordUniquenessChecker};
