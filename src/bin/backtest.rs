use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use perpsim::backtest::{BacktestRunner, MarketScenario, Report, SyntheticDataGenerator};
use perpsim::strategy::ema_cross::{EmaCrossConfig, EmaCrossStrategy};
use perpsim::{Result, SimConfig, SimError};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Uptrend,
    Downtrend,
    Sideways,
    Volatile,
    Crash,
}

impl From<Scenario> for MarketScenario {
    fn from(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Uptrend => MarketScenario::Uptrend,
            Scenario::Downtrend => MarketScenario::Downtrend,
            Scenario::Sideways => MarketScenario::Sideways,
            Scenario::Volatile => MarketScenario::Volatile,
            Scenario::Crash => MarketScenario::Crash,
        }
    }
}

/// Run the execution simulator over synthetic market scenarios
#[derive(Parser)]
#[command(name = "backtest")]
struct Args {
    /// JSON file with the simulator configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single scenario instead of the full sweep
    #[arg(long, value_enum)]
    scenario: Option<Scenario>,

    /// Number of candles to generate
    #[arg(long, default_value_t = 1_000)]
    candles: usize,

    /// Minutes per candle
    #[arg(long, default_value_t = 5)]
    interval: i64,

    /// RNG seed for the synthetic data
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| SimError::Configuration(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| SimError::Configuration(format!("cannot parse {}: {}", path.display(), e)))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perpsim=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    config.validate()?;

    let scenarios: Vec<(MarketScenario, &str)> = match args.scenario {
        Some(scenario) => vec![(scenario.into(), "requested scenario")],
        None => vec![
            (MarketScenario::Uptrend, "uptrend (+2% daily)"),
            (MarketScenario::Downtrend, "downtrend (-2% daily)"),
            (MarketScenario::Sideways, "sideways (mean-reverting)"),
            (MarketScenario::Volatile, "volatile (±5% swings)"),
            (MarketScenario::Crash, "crash (25% drop)"),
        ],
    };

    let mut results: Vec<(String, Report)> = Vec::new();

    for (scenario, label) in scenarios {
        tracing::info!("running scenario: {}", label);

        let mut generator = SyntheticDataGenerator::new(args.seed);
        let candles = generator.generate(scenario, args.candles, args.interval);

        let mut strategy =
            EmaCrossStrategy::new(EmaCrossConfig::default(), config.initial_capital);
        let runner = BacktestRunner::new(config.clone());

        let report = runner.run(&mut strategy, &candles)?;
        report.print();
        results.push((label.to_string(), report));
    }

    if results.len() > 1 {
        print_comparison(&results);
    }

    Ok(())
}

fn print_comparison(results: &[(String, Report)]) {
    println!("\n{}", "=".repeat(64));
    println!("  SCENARIO COMPARISON");
    println!("{}\n", "=".repeat(64));

    println!(
        "{:<30} {:>10} {:>8} {:>6} {:>7}",
        "scenario", "pnl", "return%", "trades", "win%"
    );
    println!("{}", "-".repeat(64));

    for (name, report) in results {
        let s = &report.summary;
        println!(
            "{:<30} {:>10.2} {:>8.2} {:>6} {:>7.1}",
            name, s.total_pnl, s.total_return_pct, s.total_trades, s.win_rate
        );
    }

    if let Some((best, report)) = results.iter().max_by(|a, b| {
        a.1.summary
            .total_return_pct
            .partial_cmp(&b.1.summary.total_return_pct)
            .unwrap()
    }) {
        println!(
            "\nbest scenario: {} ({:+.2}%)",
            best, report.summary.total_return_pct
        );
    }
    println!();
}
