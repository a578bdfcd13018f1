//! Approximate-membership set over a shared bit array.
//!
//! `contains` never returns `false` for an inserted item. It may return
//! `true` for an item that was never inserted, with probability approaching
//! `(1 - e^(-kn/m))^k` after `n` insertions.

use crate::error::{Result, SketchError};
use crate::hashing::HashFamily;
use crate::storage::BitSet;
use std::f64::consts::LN_2;

/// Largest bit array a filter may be sized to (2^40 bits, 128 GiB).
pub const MAX_BIT_COUNT: usize = 1 << 40;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bits: BitSet,
    m: usize,
    k: usize,
}

impl BloomFilter {
    /// Creates a filter with `bit_count` bits addressed by `hash_count` hashes.
    pub fn new(bit_count: usize, hash_count: usize) -> Result<Self> {
        if bit_count == 0 {
            return Err(SketchError::Construction(
                "bit count must be positive".to_string(),
            ));
        }
        if hash_count == 0 {
            return Err(SketchError::Construction(
                "hash count must be positive".to_string(),
            ));
        }
        tracing::debug!(m = bit_count, k = hash_count, "creating bloom filter");
        Ok(BloomFilter {
            bits: BitSet::new(bit_count)?,
            m: bit_count,
            k: hash_count,
        })
    }

    /// Sizes a filter for `expected_items` insertions at a target false
    /// positive rate: `m = ceil(-n ln p / ln2^2)`, `k = round(m/n ln2)`.
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Result<Self> {
        let (m, k) = Self::optimal_params(expected_items, false_positive_rate)?;
        Self::new(m, k)
    }

    /// Returns the `(bit_count, hash_count)` pair for the given sizing target.
    pub fn optimal_params(
        expected_items: usize,
        false_positive_rate: f64,
    ) -> Result<(usize, usize)> {
        if expected_items == 0 {
            return Err(SketchError::Construction(
                "expected item count must be positive".to_string(),
            ));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(SketchError::Construction(format!(
                "false positive rate must be in (0, 1), got {false_positive_rate}"
            )));
        }
        let n = expected_items as f64;
        let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
        if !m.is_finite() || m > MAX_BIT_COUNT as f64 {
            return Err(SketchError::Construction(format!(
                "{expected_items} items at rate {false_positive_rate} need {m} bits, \
                 more than the supported {MAX_BIT_COUNT}"
            )));
        }
        let k = ((m / n) * LN_2).round();
        Ok(((m as usize).max(1), (k as usize).max(1)))
    }

    /// Adds an item. Returns `true` if at least one bit was newly set.
    pub fn insert(&self, item: impl AsRef<[u8]>) -> bool {
        let mut fresh = false;
        // positions are reduced modulo m, so every bit access is in range
        for pos in HashFamily::reduced_positions(item.as_ref(), self.k, self.m) {
            let set = self.bits.set(pos);
            debug_assert!(set.is_ok(), "bit position {pos} outside m={}", self.m);
            fresh |= set.unwrap_or(false);
        }
        fresh
    }

    /// Returns `true` if the item may have been inserted, `false` if it
    /// definitely was not.
    pub fn contains(&self, item: impl AsRef<[u8]>) -> bool {
        HashFamily::reduced_positions(item.as_ref(), self.k, self.m).all(|pos| {
            let bit = self.bits.get(pos);
            debug_assert!(bit.is_ok(), "bit position {pos} outside m={}", self.m);
            bit.unwrap_or(false)
        })
    }

    /// Expected false-positive probability after `item_count` insertions.
    pub fn estimated_false_positive_rate(&self, item_count: usize) -> f64 {
        let exponent = -(self.k as f64) * item_count as f64 / self.m as f64;
        (1.0 - exponent.exp()).powf(self.k as f64)
    }

    /// Estimates how many distinct items were inserted from the fraction of
    /// set bits: `-(m/k) ln(1 - X/m)`. Saturated filters report infinity.
    pub fn approximate_item_count(&self) -> f64 {
        let m = self.m as f64;
        let set = self.bits.popcount() as f64;
        if set >= m {
            return f64::INFINITY;
        }
        -(m / self.k as f64) * (1.0 - set / m).ln()
    }

    /// Bitwise OR of two filters with identical `(m, k)`.
    ///
    /// The result answers `true` for every item inserted into either input,
    /// but its false-positive rate is that of a filter holding both item
    /// sets, which is higher than either input's.
    pub fn union(&self, other: &BloomFilter) -> Result<BloomFilter> {
        if self.m != other.m || self.k != other.k {
            return Err(SketchError::IncompatibleMerge(format!(
                "bloom filters differ: (m={}, k={}) vs (m={}, k={})",
                self.m, self.k, other.m, other.k
            )));
        }
        let merged = self.clone();
        merged.bits.union_with(&other.bits)?;
        tracing::debug!(m = self.m, k = self.k, "merged bloom filters");
        Ok(merged)
    }

    pub fn popcount(&self) -> usize {
        self.bits.popcount()
    }

    pub fn bit_count(&self) -> usize {
        self.m
    }

    pub fn hash_count(&self) -> usize {
        self.k
    }

    /// Copy of the backing words, lowest bit index first.
    pub fn bits_snapshot(&self) -> Vec<u64> {
        self.bits.words_snapshot()
    }

    pub(crate) fn from_parts(
        bit_count: usize,
        hash_count: usize,
        words: Vec<u64>,
    ) -> Result<Self> {
        if hash_count == 0 {
            return Err(SketchError::Construction(
                "hash count must be positive".to_string(),
            ));
        }
        Ok(BloomFilter {
            bits: BitSet::from_words(bit_count, words)?,
            m: bit_count,
            k: hash_count,
        })
    }
}
