use hll_bloom::{EstimateRegime, HyperLogLogCounter};
use rayon::prelude::*;

pub type SeedData = (u64, Vec<(u64, f64, EstimateRegime)>);

fn process_seed(seed: u64, ns: &[u64], precision: u8) -> hll_bloom::Result<SeedData> {
    let mut points = Vec::new();
    let counter = HyperLogLogCounter::new(precision)?;

    let mut last_n = 0;
    for &n in ns {
        for i in last_n..n {
            let value = i ^ seed;
            counter.add(value.to_le_bytes());
        }
        last_n = n;

        let (estimate, regime) = counter.estimate_with_regime();
        points.push((n, estimate, regime));
    }

    Ok((seed, points))
}

/// Feeds `2^0 .. 2^20` synthetic items per seed and logs the worst relative
/// error seen at each cardinality across seeds.
pub fn run_accuracy_sweep(precision: u8) -> hll_bloom::Result<()> {
    let seeds: Vec<u64> = (1..=9).collect();
    let ns: Vec<u64> = (0..21).map(|i| 1u64 << i).collect();

    let results = seeds
        .par_iter()
        .map(|&seed| process_seed(seed, &ns, precision))
        .collect::<hll_bloom::Result<Vec<_>>>()?;

    let standard_error = 1.04 / ((1u64 << precision) as f64).sqrt();
    for (idx, &n) in ns.iter().enumerate() {
        let worst = results
            .iter()
            .map(|(_, points)| (points[idx].1 - n as f64).abs() / n as f64)
            .fold(0.0f64, f64::max);
        let regime = results[0].1[idx].2;
        tracing::info!(n, worst_relative_error = worst, standard_error, ?regime, "accuracy");
    }

    Ok(())
}
