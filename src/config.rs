//! Sizing configuration for the filter and the counter.
//!
//! ```
//! use hll_bloom::config::SketchConfig;
//!
//! let config = SketchConfig::from_json_str(r#"{ "hll": { "precision": 12 } }"#).unwrap();
//! assert_eq!(config.hll.precision, 12);
//! assert_eq!(config.bloom.expected_items, 1000);
//! ```

use crate::counters::HyperLogLogCounter;
use crate::counters::hll_counter::{MAX_PRECISION, MIN_PRECISION};
use crate::error::{Result, SketchError};
use crate::filters::{BloomFilter, PasswordUniquenessChecker};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub expected_items: usize,
    pub false_positive_rate: f64,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            expected_items: 1000,
            false_positive_rate: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HllSettings {
    pub precision: u8,
}

impl Default for HllSettings {
    fn default() -> Self {
        // 1.04 / sqrt(2^14) is just under 1% standard error
        Self { precision: 14 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub bloom: BloomSettings,
    pub hll: HllSettings,
}

impl SketchConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SketchConfig = serde_json::from_str(json)
            .map_err(|e| SketchError::Construction(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bloom.expected_items == 0 {
            return Err(SketchError::Construction(
                "bloom.expected_items must be positive".to_string(),
            ));
        }
        let rate = self.bloom.false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(SketchError::Construction(format!(
                "bloom.false_positive_rate must be in (0, 1), got {rate}"
            )));
        }
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.hll.precision) {
            return Err(SketchError::Construction(format!(
                "hll.precision must be in [{MIN_PRECISION}, {MAX_PRECISION}], got {}",
                self.hll.precision
            )));
        }
        Ok(())
    }

    pub fn build_filter(&self) -> Result<BloomFilter> {
        BloomFilter::with_rate(self.bloom.expected_items, self.bloom.false_positive_rate)
    }

    pub fn build_checker(&self) -> Result<PasswordUniquenessChecker> {
        Ok(PasswordUniquenessChecker::with_filter(self.build_filter()?))
    }

    pub fn build_counter(&self) -> Result<HyperLogLogCounter> {
        HyperLogLogCounter::new(self.hll.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SketchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.build_counter().unwrap().precision(), 14);
        let filter = config.build_filter().unwrap();
        assert_eq!(filter.bit_count(), 9586);
        assert_eq!(filter.hash_count(), 7);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            SketchConfig::from_json_str(r#"{ "bloom": { "false_positive_rate": 0.001 } }"#)
                .unwrap();
        assert_eq!(config.bloom.expected_items, 1000);
        assert_eq!(config.bloom.false_positive_rate, 0.001);
        assert_eq!(config.hll, HllSettings::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        for json in [
            r#"{ "hll": { "precision": 3 } }"#,
            r#"{ "hll": { "precision": 19 } }"#,
            r#"{ "bloom": { "expected_items": 0 } }"#,
            r#"{ "bloom": { "false_positive_rate": 1.5 } }"#,
            r#"{ "bloom": "#,
        ] {
            assert!(
                matches!(
                    SketchConfig::from_json_str(json),
                    Err(SketchError::Construction(_))
                ),
                "accepted {json}"
            );
        }
    }
}
