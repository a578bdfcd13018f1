use crate::error::{Result, SketchError};
use std::sync::atomic::{AtomicU8, Ordering};

/// Fixed-size array of 8-bit registers with atomic compare-and-max updates.
///
/// A register value never decreases.
pub struct RegisterArray {
    registers: Box<[AtomicU8]>,
}

impl RegisterArray {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SketchError::Construction(
                "register array size must be positive".to_string(),
            ));
        }
        Ok(RegisterArray {
            registers: (0..size).map(|_| AtomicU8::new(0)).collect(),
        })
    }

    pub fn from_values(values: Vec<u8>) -> Result<Self> {
        if values.is_empty() {
            return Err(SketchError::Construction(
                "register array size must be positive".to_string(),
            ));
        }
        Ok(RegisterArray {
            registers: values.into_iter().map(AtomicU8::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    #[inline(always)]
    fn slot(&self, index: usize) -> Result<&AtomicU8> {
        self.registers
            .get(index)
            .ok_or(SketchError::IndexOutOfBounds {
                index,
                len: self.registers.len(),
            })
    }

    pub fn get(&self, index: usize) -> Result<u8> {
        Ok(self.slot(index)?.load(Ordering::Relaxed))
    }

    /// Raises register `index` to `value` if `value` is larger.
    /// Returns `true` when the register changed.
    #[inline(always)]
    pub fn set_if_greater(&self, index: usize, value: u8) -> Result<bool> {
        let previous = self.slot(index)?.fetch_max(value, Ordering::Relaxed);
        Ok(value > previous)
    }

    /// Point-in-time copy of every register.
    pub fn snapshot(&self) -> Vec<u8> {
        self.registers
            .iter()
            .map(|reg| reg.load(Ordering::Relaxed))
            .collect()
    }

    /// Sum of `2^-register` and the number of zero registers, in one pass.
    pub(crate) fn harmonic_sum_and_zeros(&self) -> (f64, usize) {
        self.registers
            .iter()
            .map(|reg| reg.load(Ordering::Relaxed))
            .fold((0.0, 0), |(sum, zeros), reg| {
                (sum + 2f64.powi(-i32::from(reg)), zeros + usize::from(reg == 0))
            })
    }
}

impl Clone for RegisterArray {
    fn clone(&self) -> Self {
        RegisterArray {
            registers: self
                .registers
                .iter()
                .map(|reg| AtomicU8::new(reg.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl PartialEq for RegisterArray {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for RegisterArray {}

impl std::fmt::Debug for RegisterArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterArray")
            .field("len", &self.registers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn set_if_greater_is_monotonic() {
        let regs = RegisterArray::new(16).unwrap();
        assert!(regs.set_if_greater(3, 5).unwrap());
        assert!(!regs.set_if_greater(3, 2).unwrap());
        assert!(!regs.set_if_greater(3, 5).unwrap());
        assert_eq!(regs.get(3).unwrap(), 5);
        assert!(regs.set_if_greater(3, 9).unwrap());
        assert_eq!(regs.get(3).unwrap(), 9);
        assert_eq!(regs.get(4).unwrap(), 0);
    }

    #[test]
    fn out_of_range_access_fails() {
        let regs = RegisterArray::new(16).unwrap();
        assert_eq!(
            regs.set_if_greater(16, 1),
            Err(SketchError::IndexOutOfBounds { index: 16, len: 16 })
        );
        assert!(regs.get(99).is_err());
        assert!(regs.snapshot().iter().all(|&r| r == 0));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(RegisterArray::new(0).is_err());
        assert!(RegisterArray::from_values(Vec::new()).is_err());
    }

    #[test]
    fn harmonic_sum_counts_zeros() {
        let regs = RegisterArray::from_values(vec![0, 1, 2, 0]).unwrap();
        let (sum, zeros) = regs.harmonic_sum_and_zeros();
        assert_eq!(zeros, 2);
        assert!((sum - 2.75).abs() < 1e-12);
    }

    #[test]
    fn concurrent_max_keeps_largest() {
        let regs = Arc::new(RegisterArray::new(4).unwrap());
        let handles: Vec<_> = (1..=32u8)
            .map(|v| {
                let regs = Arc::clone(&regs);
                thread::spawn(move || {
                    for i in 0..4 {
                        regs.set_if_greater(i, v).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(regs.snapshot(), vec![32, 32, 32, 32]);
    }
}
