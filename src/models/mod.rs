use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// OHLCV candlestick data for one fixed interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Direction of a position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Why a position (or part of one) was closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitType {
    StopLoss,
    TakeProfit,
    Timeout,
    /// Strategy-driven discretionary exit
    Signal,
    /// Synthetic close of whatever remains open after the last candle
    ForceClose,
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitType::StopLoss => "stop_loss",
            ExitType::TakeProfit => "take_profit",
            ExitType::Timeout => "timeout",
            ExitType::Signal => "signal",
            ExitType::ForceClose => "force_close",
        };
        write!(f, "{}", name)
    }
}

/// Trading signal, produced once per candle by the strategy.
///
/// Each variant carries only the fields its execution path reads, so a
/// partial close cannot be confused with an entry by sharing a `type` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    Enter {
        side: Side,
        price: f64,
        amount: f64,
        leverage: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
    Exit {
        exit_type: ExitType,
        price: f64,
        /// Fraction of the remaining position to close, in (0, 1].
        exit_ratio: f64,
    },
    Hold {
        reason: String,
    },
}

impl Signal {
    /// Convenience constructor for the common no-action case
    pub fn hold(reason: impl Into<String>) -> Self {
        Signal::Hold {
            reason: reason.into(),
        }
    }
}

/// Record of one realized exit (full or partial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Contracts closed by this exit, not the position's original size
    pub amount: f64,
    pub pnl_ratio: f64,
    pub pnl_amount: f64,
    /// Share of the position's entry fee amortized onto this exit
    pub open_fee: f64,
    pub close_fee: f64,
    pub net_pnl: f64,
    pub exit_type: ExitType,
    pub holding_minutes: i64,
}

/// One equity sample, taken after each processed candle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub price: f64,
}
