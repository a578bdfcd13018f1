use crate::counters::{Counter, ExactCounter, HyperLogLogCounter};
use crate::error::{Result, SketchError};
use rayon::prelude::*;
use std::time::{Duration, Instant};

const CHUNK_SIZE: usize = 16 * 1024;

/// Counts distinct items with one unshared counter per chunk, merging the
/// shards at the end. Returns the number of items seen and the merged counter.
pub fn count_distinct_parallel<T>(items: &[T], precision: u8) -> Result<(u64, HyperLogLogCounter)>
where
    T: AsRef<[u8]> + Sync,
{
    // every shard starts as a clone of this validated empty counter
    let empty = HyperLogLogCounter::new(precision)?;

    let (seen, counter) = items
        .par_chunks(CHUNK_SIZE)
        .map(|chunk| {
            let counter = empty.clone();
            for item in chunk {
                counter.add(item);
            }
            Ok::<_, SketchError>((chunk.len() as u64, counter))
        })
        .try_reduce(
            || (0, empty.clone()),
            |(count_a, a), (count_b, b)| {
                a.merge_from(&b)?;
                Ok((count_a + count_b, a))
            },
        )?;

    tracing::debug!(seen, precision, "parallel count finished");
    Ok((seen, counter))
}

/// Exact and approximate distinct counts over the same items.
#[derive(Debug, Clone, PartialEq)]
pub struct CountComparison {
    pub exact: usize,
    pub approximate: f64,
    pub exact_elapsed: Duration,
    pub approximate_elapsed: Duration,
}

impl CountComparison {
    /// `|approximate - exact| / exact`, or zero for an empty input.
    pub fn relative_error(&self) -> f64 {
        if self.exact == 0 {
            return self.approximate.abs();
        }
        (self.approximate - self.exact as f64).abs() / self.exact as f64
    }
}

/// Runs an exact set-based count and a HyperLogLog count over `items`.
pub fn compare_counts<T: AsRef<[u8]>>(items: &[T], precision: u8) -> Result<CountComparison> {
    let approx = HyperLogLogCounter::new(precision)?;

    let start = Instant::now();
    let mut exact = ExactCounter::new();
    for item in items {
        exact.add(item.as_ref());
    }
    let exact_elapsed = start.elapsed();

    let start = Instant::now();
    for item in items {
        approx.add(item);
    }
    let approximate = approx.estimate();
    let approximate_elapsed = start.elapsed();

    let comparison = CountComparison {
        exact: exact.len(),
        approximate,
        exact_elapsed,
        approximate_elapsed,
    };
    tracing::info!(
        exact = comparison.exact,
        approximate = comparison.approximate,
        relative_error = comparison.relative_error(),
        "compared distinct counts"
    );
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(n: u32) -> Vec<String> {
        (0..n)
            .map(|i| format!("10.{}.{}.{}", (i >> 16) & 255, (i >> 8) & 255, i & 255))
            .collect()
    }

    #[test]
    fn parallel_matches_sequential_registers() {
        let items = addresses(100_000);
        let (seen, parallel) = count_distinct_parallel(&items, 12).unwrap();
        assert_eq!(seen, 100_000);

        let sequential = HyperLogLogCounter::new(12).unwrap();
        for item in &items {
            sequential.add(item);
        }
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn parallel_rejects_bad_precision() {
        let items = addresses(10);
        assert!(count_distinct_parallel(&items, 2).is_err());
    }

    #[test]
    fn parallel_on_empty_input() {
        let items: Vec<String> = Vec::new();
        let (seen, counter) = count_distinct_parallel(&items, 8).unwrap();
        assert_eq!(seen, 0);
        assert_eq!(counter.estimate(), 0.0);
    }

    #[test]
    fn comparison_with_repeats() {
        let mut items = addresses(20_000);
        items.extend(addresses(5_000));
        let comparison = compare_counts(&items, 14).unwrap();
        assert_eq!(comparison.exact, 20_000);
        assert!(comparison.relative_error() < 0.05);
    }

    #[test]
    fn relative_error_of_empty_input() {
        let items: Vec<&str> = Vec::new();
        let comparison = compare_counts(&items, 10).unwrap();
        assert_eq!(comparison.exact, 0);
        assert_eq!(comparison.relative_error(), 0.0);
    }
}
