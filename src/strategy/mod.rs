// Strategy capability interface consumed by the backtest runner
pub mod ema_cross;

pub use ema_cross::EmaCrossStrategy;

use crate::models::{Candle, Signal, Trade};

/// Base trait for all trading strategies.
///
/// The runner calls `analyze` once per candle as soon as the sliding window
/// reaches `min_candles`. Strategies own all of their decision state; the
/// simulator mirrors ledger transitions back through the notification hooks
/// and never inspects strategy internals.
///
/// An `Err` from `analyze` is a strategy fault: the run aborts and the error
/// propagates unmodified. Data problems a strategy can survive should be
/// reported as `Signal::Hold { reason }` instead.
pub trait Strategy: Send {
    /// Produce a trading signal for the current window
    fn analyze(&mut self, window: &[Candle]) -> anyhow::Result<Signal>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles the window must hold before `analyze` is called
    fn min_candles(&self) -> usize;

    /// Notification that the ledger applied `signal` (entry or exit)
    fn update_position(&mut self, _signal: &Signal) {}

    /// Notification of a completed (full or partial) trade
    fn record_trade(&mut self, _trade: &Trade) {}

    /// Called once whenever the candle's calendar date rolls over
    fn reset_daily_stats(&mut self) {}

    /// Compounding hook: the simulator's capital after each close
    fn update_capital(&mut self, _new_capital: f64) {}
}
