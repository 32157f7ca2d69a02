//! Example usage of the synthetic market data library
//!
//! Run with: cargo run --release [-- path/to/config.json]
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use synthquant::{
    build_dataset, build_realistic_dataset,
    dataset::{AssetSpec, RealisticAsset},
    generate_path,
    series::minute_anchor,
    Dataset, DatasetRequest, EventInjector, EventSpec, GeneratorConfig, MarketProfiler,
    PathStatistics, RealisticDatasetRequest, SimulationError, StaticHistory,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    };

    println!("=== SynthQuant ===\n");

    if let Err(err) = run(&config) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn load_config() -> Result<GeneratorConfig, SimulationError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| SimulationError::InvalidConfig(format!("cannot read {path}: {e}")))?;
            GeneratorConfig::from_json_str(&json)
        }
        None => Ok(GeneratorConfig::default()),
    }
}

fn run(config: &GeneratorConfig) -> Result<(), SimulationError> {
    example_single_path(config)?;
    example_events(config)?;
    example_dataset(config)?;
    example_realistic_dataset(config)?;
    Ok(())
}

fn example_single_path(config: &GeneratorConfig) -> Result<(), SimulationError> {
    println!("--- Single path ---");

    let params = config.simulation_parameters().with_seed(42);
    let series = generate_path(&params, config.frequency, minute_anchor(Utc::now()))?;

    println!(
        "{} points at {} over {} days",
        series.len(),
        config.frequency,
        config.horizon_days
    );
    if let Some(stats) = PathStatistics::from_prices(&series.present_prices()) {
        println!("Start: ${:.2}  End: ${:.2}", stats.start, stats.end);
        println!("Min: ${:.2}  Max: ${:.2}", stats.min, stats.max);
        println!("Total return: {:+.2}%", stats.total_return * 100.0);
        println!("Step volatility: {:.4}", stats.return_std);
    }
    let expected = params.validate()?.expected_value(config.horizon_days as f64);
    println!("Expected end (E[S_T]): ${expected:.2}");
    println!();
    Ok(())
}

fn example_events(config: &GeneratorConfig) -> Result<(), SimulationError> {
    println!("--- Event injection ---");

    let params = config.simulation_parameters().with_seed(7);
    let series = generate_path(&params, config.frequency, minute_anchor(Utc::now()))?;
    let third = (series.len() / 3) as i64;

    let events = [
        EventSpec::ipo(10),
        EventSpec::earnings(third, 0.08),
        EventSpec::crash(2 * third, 0.3, 24),
    ];
    let shocked = EventInjector::new().with_seed(7).apply_events(&series, &events, "price");

    let checkpoints = [
        ("after IPO", 10),
        ("after earnings", third as usize),
        ("end", shocked.len() - 1),
    ];
    for (label, index) in checkpoints {
        match shocked.points.get(index).and_then(|p| p.price) {
            Some(p) => println!("  {label:>15}: ${p:.2}"),
            None => println!("  {label:>15}: -"),
        }
    }
    println!();
    Ok(())
}

fn example_dataset(config: &GeneratorConfig) -> Result<(), SimulationError> {
    println!("--- Dataset ---");

    let request = DatasetRequest::new(
        vec![AssetSpec::new("BTC", 40_000.0), AssetSpec::new("ETH", 2_500.0)],
        42,
    )
    .with_frequency(config.frequency)
    .with_horizon_days(config.horizon_days)
    .with_events(vec![EventSpec::crash(48, 0.25, 12)]);

    let dataset = build_dataset(&request, minute_anchor(Utc::now()))?;
    println!("Rows per asset: {}  Realism score: {}", dataset.total_rows, dataset.realism_score);
    print_preview(&dataset, config.preview_rows);
    println!();
    Ok(())
}

fn example_realistic_dataset(config: &GeneratorConfig) -> Result<(), SimulationError> {
    println!("--- Calibrated dataset ---");

    // Stand-in history: one year of a gently trending, noisy close series
    let closes: Vec<f64> = (0..250)
        .map(|i| {
            let noise = 0.012 * ((i * 7 % 11) as f64 - 5.0) / 5.0;
            180.0 * (1.0 + 0.0004 * i as f64) * (1.0 + noise)
        })
        .collect();
    let profiler = MarketProfiler::new(StaticHistory::new().with_closes("AAPL", closes));

    let request = RealisticDatasetRequest::new(
        vec![RealisticAsset::new("AAPL", "US").with_multipliers(1.0, 1.5)],
        7,
    )
    .with_frequency(config.frequency)
    .with_horizon_days(config.horizon_days);

    let dataset = build_realistic_dataset(&request, &profiler, minute_anchor(Utc::now()))?;
    let market = profiler.parameters("AAPL", "US", true)?;
    println!(
        "AAPL drift: {:.5}/day  volatility: {:.4}/day  last close: ${:.2}",
        market.drift, market.volatility, market.last_price
    );
    println!("Rows per asset: {}  Realism score: {}", dataset.total_rows, dataset.realism_score);
    print_preview(&dataset, config.preview_rows);
    Ok(())
}

fn print_preview(dataset: &Dataset, rows: usize) {
    for asset in dataset.preview(rows) {
        let prices: Vec<String> = asset
            .prices
            .iter()
            .map(|p| p.map_or_else(|| "-".to_string(), |p| format!("{p:.2}")))
            .collect();
        println!("  {}: {}", asset.symbol, prices.join(" "));
    }
}
