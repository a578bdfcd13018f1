pub mod bit_set;
pub mod register_array;

pub use bit_set::BitSet;
pub use register_array::RegisterArray;
