use super::Strategy;
use crate::indicators::{calculate_ema, calculate_rsi};
use crate::models::{Candle, ExitType, Side, Signal, Trade};

/// Tunables for [`EmaCrossStrategy`]
#[derive(Debug, Clone)]
pub struct EmaCrossConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    /// Skip long entries above this RSI
    pub rsi_overbought: f64,
    /// Skip short entries below this RSI
    pub rsi_oversold: f64,
    pub leverage: f64,
    /// Fraction of current capital committed as margin per entry
    pub margin_fraction: f64,
    pub stop_loss_pct: f64,
    /// First profit target, closes `first_close_ratio` of the position
    pub first_target_pct: f64,
    pub first_close_ratio: f64,
    /// Second profit target, closes the remainder
    pub second_target_pct: f64,
    pub max_daily_entries: u32,
}

impl Default for EmaCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: 9,
            slow_period: 21,
            rsi_period: 14,
            rsi_overbought: 75.0,
            rsi_oversold: 25.0,
            leverage: 3.0,
            margin_fraction: 0.9,
            stop_loss_pct: 0.02,
            first_target_pct: 0.02,
            first_close_ratio: 0.5,
            second_target_pct: 0.04,
            max_daily_entries: 10,
        }
    }
}

/// The strategy's mirror of the ledger, maintained via notification hooks
#[derive(Debug, Clone, Copy)]
struct OpenPosition {
    side: Side,
    entry_price: f64,
    first_target_hit: bool,
}

/// Decision state. Owned by the strategy instance, never by the simulator.
#[derive(Debug, Clone)]
pub struct EmaCrossState {
    capital: f64,
    position: Option<OpenPosition>,
    daily_entries: u32,
}

/// EMA crossover strategy with an RSI entry filter and staged profit taking.
///
/// Goes long when the fast EMA crosses above the slow EMA (short on the
/// opposite cross), sizes each entry as a fixed fraction of the capital the
/// simulator last reported, cuts losses at a fixed stop, takes half the
/// position at the first target and the rest at the second, and exits
/// whenever the EMAs cross back against the position.
pub struct EmaCrossStrategy {
    config: EmaCrossConfig,
    state: EmaCrossState,
}

impl EmaCrossStrategy {
    pub fn new(config: EmaCrossConfig, initial_capital: f64) -> Self {
        Self {
            config,
            state: EmaCrossState {
                capital: initial_capital,
                position: None,
                daily_entries: 0,
            },
        }
    }
}

/// Pure decision function: `(window, state) -> signal`.
///
/// No logging and no mutation, so tables of windows and states can be
/// asserted against directly in tests. State transitions happen in the
/// notification hooks, driven by what the ledger actually applied.
fn decide(window: &[Candle], state: &EmaCrossState, config: &EmaCrossConfig) -> Signal {
    if window.windows(2).any(|w| w[1].timestamp <= w[0].timestamp) {
        return Signal::hold("window is not strictly time-ordered");
    }

    let closes: Vec<f64> = window.iter().map(|c| c.close).collect();
    let price = *closes.last().expect("runner guarantees a non-empty window");

    let (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
        calculate_ema(&closes, config.fast_period),
        calculate_ema(&closes, config.slow_period),
        calculate_ema(&closes[..closes.len() - 1], config.fast_period),
        calculate_ema(&closes[..closes.len() - 1], config.slow_period),
    ) else {
        return Signal::hold("not enough closes for EMA pair");
    };

    if let Some(position) = &state.position {
        let pnl_pct = match position.side {
            Side::Long => (price - position.entry_price) / position.entry_price,
            Side::Short => (position.entry_price - price) / position.entry_price,
        };

        if pnl_pct <= -config.stop_loss_pct {
            return Signal::Exit {
                exit_type: ExitType::StopLoss,
                price,
                exit_ratio: 1.0,
            };
        }

        if position.first_target_hit && pnl_pct >= config.second_target_pct {
            return Signal::Exit {
                exit_type: ExitType::TakeProfit,
                price,
                exit_ratio: 1.0,
            };
        }

        if !position.first_target_hit && pnl_pct >= config.first_target_pct {
            return Signal::Exit {
                exit_type: ExitType::TakeProfit,
                price,
                exit_ratio: config.first_close_ratio,
            };
        }

        // Trend flipped against the position
        let crossed_against = match position.side {
            Side::Long => prev_fast >= prev_slow && fast < slow,
            Side::Short => prev_fast <= prev_slow && fast > slow,
        };
        if crossed_against {
            return Signal::Exit {
                exit_type: ExitType::Signal,
                price,
                exit_ratio: 1.0,
            };
        }

        return Signal::hold("holding through open position");
    }

    if state.daily_entries >= config.max_daily_entries {
        return Signal::hold("daily entry limit reached");
    }

    let Some(rsi) = calculate_rsi(&closes, config.rsi_period) else {
        return Signal::hold("not enough closes for RSI");
    };

    let crossed_up = prev_fast <= prev_slow && fast > slow;
    let crossed_down = prev_fast >= prev_slow && fast < slow;

    let side = if crossed_up && rsi < config.rsi_overbought {
        Side::Long
    } else if crossed_down && rsi > config.rsi_oversold {
        Side::Short
    } else {
        return Signal::hold("no actionable crossover");
    };

    let margin = state.capital * config.margin_fraction;
    let amount = margin * config.leverage / price;

    let (stop_loss, take_profit) = match side {
        Side::Long => (
            price * (1.0 - config.stop_loss_pct),
            price * (1.0 + config.second_target_pct),
        ),
        Side::Short => (
            price * (1.0 + config.stop_loss_pct),
            price * (1.0 - config.second_target_pct),
        ),
    };

    Signal::Enter {
        side,
        price,
        amount,
        leverage: config.leverage,
        stop_loss: Some(stop_loss),
        take_profit: Some(take_profit),
    }
}

impl Strategy for EmaCrossStrategy {
    fn analyze(&mut self, window: &[Candle]) -> anyhow::Result<Signal> {
        if window.is_empty() {
            anyhow::bail!("analyze called with an empty window");
        }
        Ok(decide(window, &self.state, &self.config))
    }

    fn name(&self) -> &str {
        "EmaCrossStrategy"
    }

    fn min_candles(&self) -> usize {
        // One extra close for the previous-bar EMA pair, one for RSI changes
        self.config.slow_period.max(self.config.rsi_period) + 2
    }

    fn update_position(&mut self, signal: &Signal) {
        match signal {
            Signal::Enter { side, price, .. } => {
                self.state.position = Some(OpenPosition {
                    side: *side,
                    entry_price: *price,
                    first_target_hit: false,
                });
                self.state.daily_entries += 1;
            }
            Signal::Exit { exit_ratio, .. } => {
                if *exit_ratio < 1.0 {
                    if let Some(position) = &mut self.state.position {
                        position.first_target_hit = true;
                    }
                } else {
                    self.state.position = None;
                }
            }
            Signal::Hold { .. } => {}
        }
    }

    fn record_trade(&mut self, trade: &Trade) {
        tracing::debug!(
            "strategy saw {} trade: {:+.2} ({})",
            trade.side,
            trade.net_pnl,
            trade.exit_type
        );
    }

    fn reset_daily_stats(&mut self) {
        self.state.daily_entries = 0;
    }

    fn update_capital(&mut self, new_capital: f64) {
        self.state.capital = new_capital;
    }
}
