use hll_bloom::config::SketchConfig;

pub fn run(config: &SketchConfig) -> hll_bloom::Result<()> {
    let mut checker = config.build_checker()?;
    checker.seed(["password123", "admin123", "qwerty123"]);

    let candidates = [
        Some("password123"),
        Some("newpassword"),
        Some("admin123"),
        Some("guest"),
        None,
        Some(""),
    ];
    for (candidate, status) in checker.check_all(candidates) {
        tracing::info!(password = ?candidate, %status, "password check");
    }

    let filter = checker.filter();
    tracing::info!(
        bits = filter.bit_count(),
        hashes = filter.hash_count(),
        set = filter.popcount(),
        false_positive_rate = filter.estimated_false_positive_rate(5),
        "password filter state"
    );
    Ok(())
}
