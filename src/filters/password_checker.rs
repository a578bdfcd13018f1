//! Password-reuse detection on top of a Bloom filter.
//!
//! An `AlreadyUsed` verdict is probabilistic: a password that was never seen
//! can collide with earlier ones and be rejected, with the filter's
//! false-positive probability. A `Unique` verdict is always correct, and the
//! password is recorded so every later check of it reports `AlreadyUsed`.

use crate::error::{Result, SketchError};
use crate::filters::BloomFilter;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordStatus {
    /// Missing or empty input. Never recorded.
    Invalid,
    /// The filter reports the password as seen, possibly falsely.
    AlreadyUsed,
    /// Not seen before; now recorded.
    Unique,
}

impl fmt::Display for PasswordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PasswordStatus::Invalid => "invalid",
            PasswordStatus::AlreadyUsed => "already used",
            PasswordStatus::Unique => "unique",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct PasswordUniquenessChecker {
    filter: BloomFilter,
}

impl PasswordUniquenessChecker {
    pub fn new(expected_passwords: usize, false_positive_rate: f64) -> Result<Self> {
        Ok(Self::with_filter(BloomFilter::with_rate(
            expected_passwords,
            false_positive_rate,
        )?))
    }

    pub fn with_filter(filter: BloomFilter) -> Self {
        PasswordUniquenessChecker { filter }
    }

    /// Records passwords known to be in use, without checking them.
    pub fn seed<I, S>(&mut self, existing: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for password in existing {
            self.filter.insert(password.as_ref().as_bytes());
        }
    }

    fn validate(password: Option<&str>) -> Result<&str> {
        match password {
            None => Err(SketchError::Validation("password is missing".to_string())),
            Some("") => Err(SketchError::Validation("password is empty".to_string())),
            Some(password) => Ok(password),
        }
    }

    /// Like [`check`](Self::check), but reports invalid input as an error.
    pub fn try_check(&mut self, password: Option<&str>) -> Result<PasswordStatus> {
        let password = Self::validate(password)?;
        if self.filter.contains(password.as_bytes()) {
            return Ok(PasswordStatus::AlreadyUsed);
        }
        self.filter.insert(password.as_bytes());
        Ok(PasswordStatus::Unique)
    }

    pub fn check(&mut self, password: Option<&str>) -> PasswordStatus {
        match self.try_check(password) {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(%err, "rejected password check");
                PasswordStatus::Invalid
            }
        }
    }

    /// Checks candidates in order, returning each alongside its verdict.
    pub fn check_all<'a, I>(&mut self, candidates: I) -> Vec<(Option<&'a str>, PasswordStatus)>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .map(|candidate| (candidate, self.check(candidate)))
            .collect()
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_checker() -> PasswordUniquenessChecker {
        let mut checker = PasswordUniquenessChecker::new(1000, 0.001).unwrap();
        checker.seed(["password123", "admin123", "qwerty123"]);
        checker
    }

    #[test]
    fn scenario_statuses() {
        let mut checker = seeded_checker();
        let results = checker.check_all([
            Some("password123"),
            Some("newpassword"),
            Some("admin123"),
            Some("guest"),
            None,
            Some(""),
        ]);
        let statuses: Vec<PasswordStatus> = results.iter().map(|(_, status)| *status).collect();
        assert_eq!(
            statuses,
            vec![
                PasswordStatus::AlreadyUsed,
                PasswordStatus::Unique,
                PasswordStatus::AlreadyUsed,
                PasswordStatus::Unique,
                PasswordStatus::Invalid,
                PasswordStatus::Invalid,
            ]
        );
        assert_eq!(results[1].0, Some("newpassword"));

        assert_eq!(checker.check(Some("newpassword")), PasswordStatus::AlreadyUsed);
        assert_eq!(checker.check(Some("guest")), PasswordStatus::AlreadyUsed);
    }

    #[test]
    fn invalid_input_is_not_recorded() {
        let mut checker = seeded_checker();
        let before = checker.filter().popcount();
        assert_eq!(
            checker.try_check(None),
            Err(SketchError::Validation("password is missing".to_string()))
        );
        assert!(matches!(
            checker.try_check(Some("")),
            Err(SketchError::Validation(_))
        ));
        assert_eq!(checker.check(Some("")), PasswordStatus::Invalid);
        assert_eq!(checker.filter().popcount(), before);
        assert!(!checker.filter().contains(""));
    }

    #[test]
    fn unique_then_already_used() {
        let mut checker = PasswordUniquenessChecker::new(100, 0.01).unwrap();
        assert_eq!(checker.check(Some("correct horse")), PasswordStatus::Unique);
        assert_eq!(checker.check(Some("correct horse")), PasswordStatus::AlreadyUsed);
    }

    #[test]
    fn saturated_filter_rejects_new_passwords() {
        // a single-bit filter collides on everything once any password lands
        let mut checker = PasswordUniquenessChecker::with_filter(BloomFilter::new(1, 1).unwrap());
        assert_eq!(checker.check(Some("first")), PasswordStatus::Unique);
        assert_eq!(checker.check(Some("never seen")), PasswordStatus::AlreadyUsed);
    }

    #[test]
    fn status_labels() {
        assert_eq!(PasswordStatus::AlreadyUsed.to_string(), "already used");
        assert_eq!(PasswordStatus::Unique.to_string(), "unique");
        assert_eq!(PasswordStatus::Invalid.to_string(), "invalid");
    }
}
