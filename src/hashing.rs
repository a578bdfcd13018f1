//! Hash family shared by the Bloom filter and the HyperLogLog counter.
//!
//! Every position is derived from two xxh64 evaluations with fixed seeds, so
//! results are reproducible across processes and machines. Changing either
//! seed changes every persisted sketch and requires a format version bump.

use crate::counters::hll_counter::{MAX_PRECISION, MIN_PRECISION};
use crate::error::{Result, SketchError};
use xxhash_rust::xxh64::xxh64;

const SEED_PRIMARY: u64 = 0x9E37_79B9_7F4A_7C15;
const SEED_SECONDARY: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Stateless double-hashing family over xxh64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashFamily;

impl HashFamily {
    #[inline(always)]
    pub fn base_hash(item: &[u8]) -> u64 {
        xxh64(item, SEED_PRIMARY)
    }

    #[inline(always)]
    pub fn step_hash(item: &[u8]) -> u64 {
        xxh64(item, SEED_SECONDARY)
    }

    /// Returns `count` hash values `h + i*g` for `i in 0..count`.
    pub fn hashes(item: &[u8], count: usize) -> impl Iterator<Item = u64> {
        let h = Self::base_hash(item);
        let g = Self::step_hash(item);
        (0..count as u64).map(move |i| h.wrapping_add(i.wrapping_mul(g)))
    }

    /// Returns `count` positions in `[0, m)`. Fails when `m` is zero.
    pub fn positions(item: &[u8], count: usize, m: usize) -> Result<impl Iterator<Item = usize>> {
        if m == 0 {
            return Err(SketchError::Construction(
                "position range must be positive".to_string(),
            ));
        }
        Ok(Self::reduced_positions(item, count, m))
    }

    /// `positions` for callers that already hold a validated, positive `m`.
    #[inline(always)]
    pub(crate) fn reduced_positions(
        item: &[u8],
        count: usize,
        m: usize,
    ) -> impl Iterator<Item = usize> {
        let m = m as u64;
        Self::hashes(item, count).map(move |hash| (hash % m) as usize)
    }

    /// Routes an item to a HyperLogLog register.
    ///
    /// The top `precision` bits of the base hash select the register; the
    /// rank is one plus the number of leading zeros in the remaining
    /// `64 - precision` bits, capped at `64 - precision + 1`. Precision must
    /// lie in the counter's supported range.
    pub fn register_index_and_rank(item: &[u8], precision: u8) -> Result<(usize, u8)> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::Construction(format!(
                "precision must be in [{MIN_PRECISION}, {MAX_PRECISION}], got {precision}"
            )));
        }
        Ok(Self::route_hash(Self::base_hash(item), precision))
    }

    #[inline(always)]
    pub(crate) fn route_hash(hash: u64, precision: u8) -> (usize, u8) {
        let p = u32::from(precision);
        let index = (hash >> (64 - p)) as usize;
        let remainder = hash << p;
        // leading_zeros() of zero is 64, so the cap also covers an all-zero tail
        let rank = std::cmp::min(remainder.leading_zeros(), 64 - p) + 1;
        (index, rank as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hashes_are_deterministic() {
        let a: Vec<u64> = HashFamily::hashes(b"192.168.0.1", 7).collect();
        let b: Vec<u64> = HashFamily::hashes(b"192.168.0.1", 7).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn base_and_step_hashes_differ() {
        assert_ne!(
            HashFamily::base_hash(b"password123"),
            HashFamily::step_hash(b"password123")
        );
    }

    #[test]
    fn positions_stay_in_range() {
        for m in [1usize, 7, 64, 1000, 9_585] {
            for i in 0..500 {
                let item = format!("item_{i}");
                for pos in HashFamily::positions(item.as_bytes(), 11, m).unwrap() {
                    assert!(pos < m, "position {pos} escaped m={m}");
                }
            }
        }
    }

    #[test]
    fn positions_are_spread() {
        let positions: HashSet<usize> = HashFamily::positions(b"admin123", 7, 10_000)
            .unwrap()
            .collect();
        assert!(positions.len() >= 5);
    }

    #[test]
    fn positions_roughly_uniform() {
        let m = 1000;
        let mut buckets = [0usize; 10];
        for i in 0..1000 {
            let item = format!("element_{i}");
            for pos in HashFamily::positions(item.as_bytes(), 7, m).unwrap() {
                buckets[pos / 100] += 1;
            }
        }
        for count in buckets {
            assert!((350..=1050).contains(&count), "bucket count {count}");
        }
    }

    #[test]
    fn route_hash_takes_top_bits_as_index() {
        let (index, rank) = HashFamily::route_hash(0xF000_0000_0000_0000, 4);
        assert_eq!(index, 0xF);
        // remaining bits are all zero
        assert_eq!(rank, 61);

        let (index, rank) = HashFamily::route_hash(0x0800_0000_0000_0000, 4);
        assert_eq!(index, 0);
        assert_eq!(rank, 1);

        let (index, rank) = HashFamily::route_hash(0x0100_0000_0000_0000, 4);
        assert_eq!(index, 0);
        assert_eq!(rank, 4);
    }

    #[test]
    fn register_routing_bounds_hold() {
        for p in 4u8..=18 {
            for i in 0..200 {
                let item = format!("10.0.{}.{}", i / 256, i % 256);
                let (index, rank) =
                    HashFamily::register_index_and_rank(item.as_bytes(), p).unwrap();
                assert!(index < 1 << p);
                assert!(rank >= 1 && rank <= 64 - p + 1);
            }
        }
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        assert!(matches!(
            HashFamily::positions(b"x", 3, 0),
            Err(SketchError::Construction(_))
        ));
        for precision in [0u8, 3, 19, 63, 64, 255] {
            assert!(
                matches!(
                    HashFamily::register_index_and_rank(b"10.0.0.1", precision),
                    Err(SketchError::Construction(_))
                ),
                "accepted precision {precision}"
            );
        }
    }
}
