use hll_bloom::parallel_counting::{compare_counts, count_distinct_parallel};
use std::fs::File;
use std::io::{BufRead, BufReader};

pub fn run(path: &str, precision: u8) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(path, "reading addresses");
    let reader = BufReader::new(File::open(path)?);
    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let address = line.trim();
        if !address.is_empty() {
            addresses.push(address.to_string());
        }
    }

    let comparison = compare_counts(&addresses, precision)?;
    tracing::info!(
        exact = comparison.exact,
        exact_secs = comparison.exact_elapsed.as_secs_f64(),
        approximate = comparison.approximate.round(),
        approximate_secs = comparison.approximate_elapsed.as_secs_f64(),
        "unique addresses"
    );

    let (seen, counter) = count_distinct_parallel(&addresses, precision)?;
    let (estimate, regime) = counter.estimate_with_regime();
    tracing::info!(seen, estimate = estimate.round(), ?regime, "unique addresses (sharded)");
    Ok(())
}
