mod demo;

use hll_bloom::config::SketchConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Usage: hll-bloom [config.json] [addresses.txt]
    //
    // The address file holds one already-extracted address per line.
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SketchConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SketchConfig::default(),
    };

    demo::passwords::run(&config)?;
    demo::synthetic::run_accuracy_sweep(config.hll.precision)?;

    if let Some(path) = args.next() {
        demo::addresses::run(&path, config.hll.precision)?;
    }

    Ok(())
}
