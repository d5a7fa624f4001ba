use chrono::NaiveDate;

use crate::backtest::Report;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::execution::ExecutionSimulator;
use crate::models::{Candle, ExitType, Signal};
use crate::strategy::Strategy;
use crate::Result;

const PROGRESS_LOG_INTERVAL: usize = 200;

/// Replays historical candles through a strategy and simulated execution.
///
/// The loop is strictly sequential: one `analyze` call, one ledger update
/// and one equity sample per candle, in timestamp order, no I/O. Identical
/// candles and strategy decisions reproduce the report bit for bit.
pub struct BacktestRunner {
    config: SimConfig,
}

impl BacktestRunner {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Run a backtest over `candles`.
    ///
    /// The window slides one candle at a time once it reaches the strategy's
    /// declared minimum; a series shorter than that produces an empty report
    /// rather than an error. Whatever is still open after the last candle is
    /// force-closed at its close price.
    ///
    /// # Errors
    /// `SimError::Configuration` for an invalid config or an empty candle
    /// series; `SimError::Strategy` if `analyze` fails, in which case no
    /// report is produced and the run's state is discarded.
    pub fn run<S: Strategy>(&self, strategy: &mut S, candles: &[Candle]) -> Result<Report> {
        let mut sim = ExecutionSimulator::new(self.config.clone())?;

        if candles.is_empty() {
            return Err(SimError::Configuration(
                "no candles supplied to the backtest".to_string(),
            ));
        }

        let window_size = strategy.min_candles();
        tracing::info!(
            "starting backtest: {} candles, {} window, {:.2} initial capital",
            candles.len(),
            window_size,
            self.config.initial_capital
        );

        let mut last_date: Option<NaiveDate> = None;
        for i in window_size..candles.len() {
            let current = &candles[i];

            // Calendar-day rollover
            let current_date = current.timestamp.date_naive();
            if let Some(previous) = last_date {
                if previous != current_date {
                    strategy.reset_daily_stats();
                }
            }
            last_date = Some(current_date);

            let window = &candles[i - window_size..=i];
            let signal = strategy.analyze(window)?;

            match &signal {
                Signal::Enter {
                    side,
                    price,
                    amount,
                    leverage,
                    ..
                } => {
                    if sim.open_position(*side, *price, *amount, *leverage, current.timestamp) {
                        strategy.update_position(&signal);
                    }
                }
                Signal::Exit {
                    exit_type,
                    price,
                    exit_ratio,
                } => {
                    if let Some(trade) =
                        sim.close_position(*exit_type, *price, *exit_ratio, current.timestamp)
                    {
                        strategy.update_capital(sim.capital());
                        strategy.update_position(&signal);
                        strategy.record_trade(&trade);
                    }
                }
                Signal::Hold { reason } => {
                    tracing::debug!(%reason, "hold");
                }
            }

            sim.sample_equity(current.timestamp, current.close);

            if i % PROGRESS_LOG_INTERVAL == 0 {
                tracing::debug!(
                    "progress {:.1}%, capital {:.2}",
                    i as f64 / candles.len() as f64 * 100.0,
                    sim.capital()
                );
            }
        }

        // Whatever is still open settles at the final close
        let last = candles.last().expect("candles checked non-empty");
        if let Some(trade) = sim.force_close(last.close, last.timestamp) {
            let synthesized = Signal::Exit {
                exit_type: ExitType::ForceClose,
                price: last.close,
                exit_ratio: 1.0,
            };
            strategy.update_capital(sim.capital());
            strategy.update_position(&synthesized);
            strategy.record_trade(&trade);
        }

        let report = Report::generate(
            self.config.initial_capital,
            sim.capital(),
            sim.total_fees(),
            sim.trades().to_vec(),
            sim.equity_curve().to_vec(),
        );

        tracing::info!(
            "backtest complete: {} trades, pnl {:+.2} ({:+.2}%)",
            report.summary.total_trades,
            report.summary.total_pnl,
            report.summary.total_return_pct
        );

        Ok(report)
    }
}
