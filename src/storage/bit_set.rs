use crate::error::{Result, SketchError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-size bit array backed by atomic 64-bit words.
///
/// Concurrent `set` calls are safe; bits are only ever turned on.
pub struct BitSet {
    words: Box<[AtomicU64]>,
    size: usize,
}

impl BitSet {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SketchError::Construction(
                "bit set size must be positive".to_string(),
            ));
        }
        let words = (0..size.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        Ok(BitSet { words, size })
    }

    /// Rebuilds a bit set from raw little-endian-ordered words.
    ///
    /// Bits at or beyond `size` in the last word must be clear.
    pub fn from_words(size: usize, words: Vec<u64>) -> Result<Self> {
        if size == 0 {
            return Err(SketchError::Construction(
                "bit set size must be positive".to_string(),
            ));
        }
        if words.len() != size.div_ceil(64) {
            return Err(SketchError::InvalidData(format!(
                "expected {} words for {} bits, got {}",
                size.div_ceil(64),
                size,
                words.len()
            )));
        }
        let tail = size % 64;
        if tail != 0 && words[words.len() - 1] >> tail != 0 {
            return Err(SketchError::InvalidData(
                "bits set beyond the end of the bit set".to_string(),
            ));
        }
        Ok(BitSet {
            words: words.into_iter().map(AtomicU64::new).collect(),
            size,
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `true` while no bit has been set.
    pub fn none_set(&self) -> bool {
        self.words
            .iter()
            .all(|word| word.load(Ordering::Relaxed) == 0)
    }

    #[inline(always)]
    fn check(&self, index: usize) -> Result<()> {
        if index >= self.size {
            return Err(SketchError::IndexOutOfBounds {
                index,
                len: self.size,
            });
        }
        Ok(())
    }

    /// Sets the bit at `index`. Returns `true` if the bit was previously clear.
    #[inline(always)]
    pub fn set(&self, index: usize) -> Result<bool> {
        self.check(index)?;
        let mask = 1u64 << (index % 64);
        let previous = self.words[index / 64].fetch_or(mask, Ordering::Relaxed);
        Ok(previous & mask == 0)
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Result<bool> {
        self.check(index)?;
        let word = self.words[index / 64].load(Ordering::Relaxed);
        Ok(word & (1u64 << (index % 64)) != 0)
    }

    pub fn popcount(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// ORs `other` into `self`. Sizes must match.
    pub fn union_with(&self, other: &BitSet) -> Result<()> {
        if self.size != other.size {
            return Err(SketchError::IncompatibleMerge(format!(
                "bit set sizes differ: {} vs {}",
                self.size, other.size
            )));
        }
        for (mine, theirs) in self.words.iter().zip(other.words.iter()) {
            mine.fetch_or(theirs.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        Ok(())
    }

    /// Point-in-time copy of the backing words.
    pub fn words_snapshot(&self) -> Vec<u64> {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Relaxed))
            .collect()
    }
}

impl Clone for BitSet {
    fn clone(&self) -> Self {
        BitSet {
            words: self
                .words
                .iter()
                .map(|word| AtomicU64::new(word.load(Ordering::Relaxed)))
                .collect(),
            size: self.size,
        }
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.words_snapshot() == other.words_snapshot()
    }
}

impl Eq for BitSet {}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitSet")
            .field("size", &self.size)
            .field("popcount", &self.popcount())
            .finish()
    }
}
