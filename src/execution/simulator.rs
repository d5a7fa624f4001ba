use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::execution::Position;
use crate::models::{EquityPoint, ExitType, Side, Signal, Trade};
use crate::Result;

/// Turns strategy signals into simulated fills against a single-position
/// ledger.
///
/// The simulator owns the capital ledger, the open position and the equity
/// curve for one run. Fees are charged at the taker rate on both legs;
/// slippage moves every fill price against the position holder. Signals the
/// ledger cannot honor (insufficient margin, entry while a position is open,
/// unusable payloads) are logged and dropped; the run continues.
pub struct ExecutionSimulator {
    config: SimConfig,
    capital: f64,
    total_fees: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl ExecutionSimulator {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capital: config.initial_capital,
            config,
            total_fees: 0.0,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        })
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Capital plus unrealized P&L of the open position, marked at `price`
    pub fn equity(&self, price: f64) -> f64 {
        let unrealized = self
            .position
            .as_ref()
            .map(|p| p.unrealized_pnl(price))
            .unwrap_or(0.0);
        self.capital + unrealized
    }

    /// Record one equity sample. Called exactly once per processed candle.
    pub fn sample_equity(&mut self, timestamp: DateTime<Utc>, price: f64) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            equity: self.equity(price),
            price,
        });
    }

    /// Fill price after adverse slippage.
    ///
    /// Entries pay up (long buys higher, short sells lower); exits give
    /// back (long sells lower, short buys higher).
    fn fill_price(&self, price: f64, side: Side, entering: bool) -> f64 {
        let s = self.config.slippage_rate;
        let against = matches!(
            (side, entering),
            (Side::Long, true) | (Side::Short, false)
        );
        if against {
            price * (1.0 + s)
        } else {
            price * (1.0 - s)
        }
    }

    /// Try to open a position.
    ///
    /// Returns `true` if the ledger transitioned to OPEN. A rejected entry
    /// (position already open, bad payload, insufficient margin) leaves the
    /// ledger and capital untouched.
    pub fn open_position(
        &mut self,
        side: Side,
        price: f64,
        amount: f64,
        leverage: f64,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if self.position.is_some() {
            tracing::warn!(
                "entry signal while a position is open, dropped (no stacking)"
            );
            return false;
        }
        if !price.is_finite() || price <= 0.0 || !amount.is_finite() || amount <= 0.0 {
            tracing::warn!(price, amount, "entry signal with unusable fill data, dropped");
            return false;
        }
        if !leverage.is_finite() || leverage <= 0.0 {
            tracing::warn!(leverage, "entry signal with unusable leverage, dropped");
            return false;
        }

        let entry_price = self.fill_price(price, side, true);
        let notional = entry_price * amount;
        let margin = notional / leverage;

        if margin > self.capital {
            tracing::warn!(
                required = margin,
                available = self.capital,
                "insufficient margin, entry dropped"
            );
            return false;
        }

        // Market entry fills immediately, so the taker rate applies
        let open_fee = notional * self.config.taker_fee_rate;
        self.capital -= open_fee;
        self.total_fees += open_fee;

        self.position = Some(Position {
            side,
            entry_price,
            amount,
            entry_time: timestamp,
            leverage,
            margin,
            open_fee_remaining: open_fee,
        });

        tracing::info!(
            "opened {} {:.4} @ {:.2} (margin {:.2}, fee {:.4})",
            side,
            amount,
            entry_price,
            margin,
            open_fee
        );
        true
    }

    /// Close `exit_ratio` of the open position at `price`.
    ///
    /// Returns the realized trade, or `None` if there was nothing to close
    /// or the signal payload was unusable. A ratio below 1.0 shrinks the
    /// position in place; at exactly 1.0 the ledger goes FLAT.
    pub fn close_position(
        &mut self,
        exit_type: ExitType,
        price: f64,
        exit_ratio: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<Trade> {
        if self.position.is_none() {
            tracing::warn!(%exit_type, "exit signal with no open position, dropped");
            return None;
        }
        if !price.is_finite() || price <= 0.0 {
            tracing::warn!(price, "exit signal with unusable price, dropped");
            return None;
        }
        if !exit_ratio.is_finite() || exit_ratio <= 0.0 || exit_ratio > 1.0 {
            tracing::warn!(exit_ratio, "exit ratio outside (0, 1], dropped");
            return None;
        }

        let mut position = self.position.take().expect("checked above");
        let exit_price = self.fill_price(price, position.side, false);
        let exit_amount = position.amount * exit_ratio;

        let pnl_ratio = position.pnl_ratio(exit_price);
        let pnl_amount = pnl_ratio * position.entry_price * exit_amount;
        let close_fee = exit_price * exit_amount * self.config.taker_fee_rate;

        self.capital += pnl_amount - close_fee;
        self.total_fees += close_fee;

        // Amortize the entry fee across exits in proportion to the amount
        // closed, so partial closes sum back to the original fee.
        let open_fee = if exit_ratio < 1.0 {
            position.open_fee_remaining * exit_ratio
        } else {
            position.open_fee_remaining
        };
        let net_pnl = pnl_amount - open_fee - close_fee;

        let trade = Trade {
            id: Uuid::new_v4(),
            entry_time: position.entry_time,
            exit_time: timestamp,
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            amount: exit_amount,
            pnl_ratio,
            pnl_amount,
            open_fee,
            close_fee,
            net_pnl,
            exit_type,
            holding_minutes: (timestamp - position.entry_time).num_minutes(),
        };

        if exit_ratio < 1.0 {
            position.reduce(exit_ratio);
            tracing::info!(
                "partial close {} {:.4} @ {:.2} ({}, pnl {:+.2}), {:.4} remaining",
                trade.side,
                trade.amount,
                trade.exit_price,
                trade.exit_type,
                trade.pnl_amount,
                position.amount
            );
            self.position = Some(position);
        } else {
            tracing::info!(
                "closed {} {:.4} @ {:.2} ({}, pnl {:+.2})",
                trade.side,
                trade.amount,
                trade.exit_price,
                trade.exit_type,
                trade.pnl_amount
            );
        }

        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Close whatever remains open at the last candle's close.
    ///
    /// Invoked once after the data runs out. A no-op when the ledger is
    /// already FLAT.
    pub fn force_close(&mut self, price: f64, timestamp: DateTime<Utc>) -> Option<Trade> {
        if self.position.is_none() {
            return None;
        }
        tracing::warn!("data exhausted, force-closing open position");
        self.close_position(ExitType::ForceClose, price, 1.0, timestamp)
    }

    /// Route a strategy signal to the matching ledger operation.
    ///
    /// Returns the realized trade for exits that filled, `None` otherwise
    /// (entries, holds, and dropped signals).
    pub fn apply_signal(&mut self, signal: &Signal, timestamp: DateTime<Utc>) -> Option<Trade> {
        match signal {
            Signal::Enter {
                side,
                price,
                amount,
                leverage,
                ..
            } => {
                self.open_position(*side, *price, *amount, *leverage, timestamp);
                None
            }
            Signal::Exit {
                exit_type,
                price,
                exit_ratio,
            } => self.close_position(*exit_type, *price, *exit_ratio, timestamp),
            Signal::Hold { reason } => {
                tracing::debug!(%reason, "hold");
                None
            }
        }
    }
}
