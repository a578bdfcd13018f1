use crate::counters::Counter;
use std::collections::HashSet;

/// Exact distinct counter, the ground truth approximate counts are compared against.
///
/// Memory grows with the number of distinct items.
#[derive(Debug, Clone, Default)]
pub struct ExactCounter {
    seen: HashSet<Vec<u8>>,
}

impl ExactCounter {
    pub fn new() -> Self {
        ExactCounter::default()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Counter for ExactCounter {
    fn add(&mut self, item: &[u8]) {
        if !self.seen.contains(item) {
            self.seen.insert(item.to_vec());
        }
    }

    fn estimate(&self) -> f64 {
        self.seen.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_items() {
        let mut counter = ExactCounter::new();
        assert!(counter.is_empty());
        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.1", "10.0.0.3", "10.0.0.2"] {
            counter.add(ip.as_bytes());
        }
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.estimate(), 3.0);
    }
}
