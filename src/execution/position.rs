use chrono::{DateTime, Utc};

use crate::models::Side;

/// The ledger's single open position.
///
/// `amount`, `margin` and `open_fee_remaining` shrink proportionally on
/// partial exits; the struct is dropped entirely on a full or forced close.
/// At most one position exists per run.
#[derive(Debug, Clone)]
pub struct Position {
    pub side: Side,
    /// Effective (slippage-adjusted) fill price
    pub entry_price: f64,
    pub amount: f64,
    pub entry_time: DateTime<Utc>,
    pub leverage: f64,
    /// Margin reserved at entry: notional / leverage
    pub margin: f64,
    /// Entry fee not yet amortized onto an exit
    pub open_fee_remaining: f64,
}

impl Position {
    /// Side-aware directional return at `price`
    pub fn pnl_ratio(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => (price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - price) / self.entry_price,
        }
    }

    /// Unrealized P&L of the remaining amount, marked at `price`
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.pnl_ratio(price) * self.entry_price * self.amount
    }

    /// Shrink the position after a partial exit of `exit_ratio`.
    ///
    /// The caller has already taken `exit_ratio` of the amount and of the
    /// unamortized open fee; this removes them from the ledger entry.
    pub fn reduce(&mut self, exit_ratio: f64) {
        let keep = 1.0 - exit_ratio;
        self.amount *= keep;
        self.margin *= keep;
        self.open_fee_remaining *= keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_long(entry_price: f64, amount: f64) -> Position {
        Position {
            side: Side::Long,
            entry_price,
            amount,
            entry_time: Utc::now(),
            leverage: 1.0,
            margin: entry_price * amount,
            open_fee_remaining: entry_price * amount * 0.0005,
        }
    }

    #[test]
    fn test_pnl_ratio_long() {
        let position = open_long(100.0, 1.0);
        assert!((position.pnl_ratio(110.0) - 0.10).abs() < 1e-12);
        assert!((position.pnl_ratio(95.0) + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_pnl_ratio_short() {
        let position = Position {
            side: Side::Short,
            ..open_long(100.0, 1.0)
        };
        assert!((position.pnl_ratio(90.0) - 0.10).abs() < 1e-12);
        assert!((position.pnl_ratio(105.0) + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_unrealized_pnl_scales_with_amount() {
        let position = open_long(100.0, 2.0);
        // 2 contracts, +10 each
        assert!((position.unrealized_pnl(110.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_reduce_halves_everything() {
        let mut position = open_long(100.0, 2.0);
        position.reduce(0.5);
        assert!((position.amount - 1.0).abs() < 1e-12);
        assert!((position.margin - 100.0).abs() < 1e-9);
        assert!((position.open_fee_remaining - 0.05).abs() < 1e-12);
    }
}
