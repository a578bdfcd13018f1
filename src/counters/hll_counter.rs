use crate::counters::Counter;
use crate::error::{Result, SketchError};
use crate::hashing::HashFamily;
use crate::storage::RegisterArray;

const AM_4: f64 = 0.673;
const AM_5: f64 = 0.697;
const AM_6: f64 = 0.709;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 18;

/// Which estimator produced a cardinality estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateRegime {
    /// Raw estimate at or below `2.5 m` with empty registers left: `m ln(m / V)`.
    LinearCounting,
    /// Bias-corrected harmonic mean. With 64-bit hashes no large-range
    /// correction applies.
    Raw,
}

/// HyperLogLog cardinality estimator with `2^precision` registers.
///
/// `add` and `merge_from` take `&self`; registers are updated with atomic
/// compare-and-max, so one counter can be fed from many threads.
#[derive(Clone, Debug)]
pub struct HyperLogLogCounter {
    precision: u8,
    am: f64,
    registers: RegisterArray,
}

fn alpha(precision: u8) -> f64 {
    let num_registers = (1u64 << precision) as f64;
    match precision {
        4 => AM_4,
        5 => AM_5,
        6 => AM_6,
        _ => 0.7213 / (1.0 + 1.079 / num_registers),
    }
}

fn check_precision(precision: u8) -> Result<()> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(SketchError::Construction(format!(
            "precision must be in [{MIN_PRECISION}, {MAX_PRECISION}], got {precision}"
        )));
    }
    Ok(())
}

impl HyperLogLogCounter {
    pub fn new(precision: u8) -> Result<Self> {
        check_precision(precision)?;
        tracing::debug!(
            precision,
            registers = 1usize << precision,
            "creating hyperloglog counter"
        );
        Ok(HyperLogLogCounter {
            precision,
            am: alpha(precision),
            registers: RegisterArray::new(1 << precision)?,
        })
    }

    /// Picks the smallest precision whose standard error `1.04 / sqrt(2^p)`
    /// does not exceed `error_rate`.
    pub fn with_error_rate(error_rate: f64) -> Result<Self> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(SketchError::Construction(format!(
                "error rate must be in (0, 1), got {error_rate}"
            )));
        }
        let precision = (MIN_PRECISION..=MAX_PRECISION)
            .find(|&p| 1.04 / ((1u64 << p) as f64).sqrt() <= error_rate)
            .ok_or_else(|| {
                SketchError::Construction(format!(
                    "error rate {error_rate} needs more than 2^{MAX_PRECISION} registers"
                ))
            })?;
        Self::new(precision)
    }

    /// Rebuilds a counter from a register snapshot of length `2^precision`.
    pub fn from_registers(precision: u8, registers: Vec<u8>) -> Result<Self> {
        check_precision(precision)?;
        if registers.len() != 1 << precision {
            return Err(SketchError::InvalidData(format!(
                "expected {} registers for precision {precision}, got {}",
                1usize << precision,
                registers.len()
            )));
        }
        let max_rank = 64 - precision + 1;
        if let Some(&bad) = registers.iter().find(|&&reg| reg > max_rank) {
            return Err(SketchError::InvalidData(format!(
                "register value {bad} exceeds maximum rank {max_rank}"
            )));
        }
        Ok(HyperLogLogCounter {
            precision,
            am: alpha(precision),
            registers: RegisterArray::from_values(registers)?,
        })
    }

    pub fn add(&self, item: impl AsRef<[u8]>) {
        self.add_hash(HashFamily::base_hash(item.as_ref()));
    }

    #[inline(always)]
    fn add_hash(&self, hash: u64) {
        let (index, rank) = HashFamily::route_hash(hash, self.precision);
        // index has exactly `precision` bits, so it is always in range
        let updated = self.registers.set_if_greater(index, rank);
        debug_assert!(updated.is_ok(), "register {index} outside 2^{}", self.precision);
    }

    pub fn estimate(&self) -> f64 {
        self.estimate_with_regime().0
    }

    pub fn estimate_with_regime(&self) -> (f64, EstimateRegime) {
        let num_registers = self.registers.len() as f64;
        let (denominator, zeros) = self.registers.harmonic_sum_and_zeros();
        let raw = self.am * num_registers * num_registers / denominator;

        // Small range correction
        if raw <= 2.5 * num_registers && zeros > 0 {
            let estimate = num_registers * (num_registers / zeros as f64).ln();
            tracing::trace!(raw, estimate, zeros, "linear counting regime");
            return (estimate, EstimateRegime::LinearCounting);
        }
        tracing::trace!(raw, "raw estimate regime");
        (raw, EstimateRegime::Raw)
    }

    /// Returns a new counter holding the register-wise maximum of both inputs.
    pub fn merge(&self, other: &HyperLogLogCounter) -> Result<HyperLogLogCounter> {
        let merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Folds `other` into `self` in place. Fails without touching any
    /// register when the precisions differ.
    pub fn merge_from(&self, other: &HyperLogLogCounter) -> Result<()> {
        if self.precision != other.precision {
            return Err(SketchError::IncompatibleMerge(format!(
                "precision {} vs {}",
                self.precision, other.precision
            )));
        }
        for (index, rank) in other.registers.snapshot().into_iter().enumerate() {
            self.registers.set_if_greater(index, rank)?;
        }
        tracing::debug!(precision = self.precision, "merged hyperloglog counters");
        Ok(())
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Relative standard error `1.04 / sqrt(m)`.
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    pub fn registers_snapshot(&self) -> Vec<u8> {
        self.registers.snapshot()
    }
}

impl PartialEq for HyperLogLogCounter {
    fn eq(&self, other: &Self) -> bool {
        self.precision == other.precision && self.registers == other.registers
    }
}

impl Eq for HyperLogLogCounter {}

impl Counter for HyperLogLogCounter {
    fn add(&mut self, item: &[u8]) {
        HyperLogLogCounter::add(self, item);
    }

    fn estimate(&self) -> f64 {
        HyperLogLogCounter::estimate(self)
    }
}
