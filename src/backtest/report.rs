use serde::{Deserialize, Serialize};

use crate::models::{EquityPoint, Trade};

/// Aggregate statistics for one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub total_fees: f64,
    /// Fees as a percentage of initial capital
    pub fee_ratio: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// |avg_win / avg_loss|, 0 when there are no losing trades
    pub profit_factor: f64,
    pub max_drawdown_pct: f64,
    pub avg_holding_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Complete backtest output: summary, trade list and equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Report {
    /// Aggregate a finished run. Called exactly once, after the force close.
    pub fn generate(
        initial_capital: f64,
        final_capital: f64,
        total_fees: f64,
        trades: Vec<Trade>,
        equity_curve: Vec<EquityPoint>,
    ) -> Self {
        if trades.is_empty() {
            return Self {
                summary: Summary {
                    initial_capital,
                    final_capital,
                    total_pnl: 0.0,
                    total_return_pct: 0.0,
                    total_fees: 0.0,
                    fee_ratio: 0.0,
                    total_trades: 0,
                    winning_trades: 0,
                    losing_trades: 0,
                    win_rate: 0.0,
                    avg_win: 0.0,
                    avg_loss: 0.0,
                    profit_factor: 0.0,
                    max_drawdown_pct: 0.0,
                    avg_holding_minutes: 0.0,
                    message: Some("no trades generated".to_string()),
                },
                trades,
                equity_curve,
            };
        }

        let total_pnl = final_capital - initial_capital;
        let total_return_pct = total_pnl / initial_capital * 100.0;

        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.pnl_amount > 0.0).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

        let winning_pnls: Vec<f64> = trades
            .iter()
            .filter(|t| t.pnl_amount > 0.0)
            .map(|t| t.pnl_amount)
            .collect();
        let losing_pnls: Vec<f64> = trades
            .iter()
            .filter(|t| t.pnl_amount < 0.0)
            .map(|t| t.pnl_amount)
            .collect();

        let avg_win = mean(&winning_pnls);
        let avg_loss = mean(&losing_pnls);
        let profit_factor = if avg_loss != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            0.0
        };

        let avg_holding_minutes = trades
            .iter()
            .map(|t| t.holding_minutes as f64)
            .sum::<f64>()
            / total_trades as f64;

        let summary = Summary {
            initial_capital,
            final_capital,
            total_pnl,
            total_return_pct,
            total_fees,
            fee_ratio: total_fees / initial_capital * 100.0,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            max_drawdown_pct: max_drawdown_pct(initial_capital, &equity_curve),
            avg_holding_minutes,
            message: None,
        };

        Self {
            summary,
            trades,
            equity_curve,
        }
    }

    /// Print a formatted report to stdout
    pub fn print(&self) {
        let s = &self.summary;

        println!("\n{}", "=".repeat(64));
        println!("  BACKTEST REPORT");
        println!("{}", "=".repeat(64));

        println!("\n📊 CAPITAL");
        println!("  Initial Capital:   {:>12.2}", s.initial_capital);
        println!("  Final Capital:     {:>12.2}", s.final_capital);
        println!(
            "  Total P&L:         {:>+12.2} ({:+.2}%)",
            s.total_pnl, s.total_return_pct
        );
        println!(
            "  Total Fees:        {:>12.2} ({:.2}% of capital)",
            s.total_fees, s.fee_ratio
        );
        println!("  Max Drawdown:      {:>12.2}%", s.max_drawdown_pct);

        println!("\n📈 TRADES");
        println!("  Total Trades:      {:>12}", s.total_trades);
        println!(
            "  Winning / Losing:  {:>5} / {:<5} ({:.1}% win rate)",
            s.winning_trades, s.losing_trades, s.win_rate
        );

        if s.total_trades > 0 {
            println!("\n💰 WIN/LOSS");
            println!("  Average Win:       {:>+12.2}", s.avg_win);
            println!("  Average Loss:      {:>+12.2}", s.avg_loss);
            println!("  Profit Factor:     {:>12.2}", s.profit_factor);
            println!(
                "  Avg Holding:       {:>12.1} minutes ({:.1} hours)",
                s.avg_holding_minutes,
                s.avg_holding_minutes / 60.0
            );

            println!("\n🧾 RECENT TRADES (last 10)");
            println!(
                "  {:<17} {:<6} {:>9} {:>9} {:>10} {:<12}",
                "exit time", "side", "entry", "exit", "net pnl", "type"
            );
            for trade in self.trades.iter().rev().take(10).rev() {
                println!(
                    "  {:<17} {:<6} {:>9.2} {:>9.2} {:>+10.2} {:<12}",
                    trade.exit_time.format("%Y-%m-%d %H:%M"),
                    trade.side.to_string(),
                    trade.entry_price,
                    trade.exit_price,
                    trade.net_pnl,
                    trade.exit_type.to_string()
                );
            }
        }

        if let Some(message) = &s.message {
            println!("\n  note: {}", message);
        }

        println!("\n{}\n", "=".repeat(64));
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Largest peak-to-trough equity decline, as a percentage of the peak.
///
/// Single forward pass; the peak starts at initial capital so a curve that
/// only ever falls is measured against the starting stake.
fn max_drawdown_pct(initial_capital: f64, equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        let drawdown = (peak - point.equity) / peak;
        if drawdown > max_dd {
            max_dd = drawdown;
        }
    }

    max_dd * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExitType, Side};
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        "2024-03-01T00:00:00Z".parse().unwrap()
    }

    fn trade(pnl_amount: f64, holding_minutes: i64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            entry_time: t0(),
            exit_time: t0() + Duration::minutes(holding_minutes),
            side: Side::Long,
            entry_price: 100.0,
            exit_price: 100.0 + pnl_amount,
            amount: 1.0,
            pnl_ratio: pnl_amount / 100.0,
            pnl_amount,
            open_fee: 0.05,
            close_fee: 0.05,
            net_pnl: pnl_amount - 0.1,
            exit_type: ExitType::Signal,
            holding_minutes,
        }
    }

    fn equity_point(offset_minutes: i64, equity: f64) -> EquityPoint {
        EquityPoint {
            timestamp: t0() + Duration::minutes(offset_minutes),
            equity,
            price: 100.0,
        }
    }

    #[test]
    fn test_empty_run_message() {
        let report = Report::generate(300.0, 300.0, 0.0, vec![], vec![]);
        let s = &report.summary;

        assert_eq!(s.message.as_deref(), Some("no trades generated"));
        assert_eq!(s.total_trades, 0);
        assert_eq!(s.total_pnl, 0.0);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.profit_factor, 0.0);
        assert_eq!(s.max_drawdown_pct, 0.0);
    }

    #[test]
    fn test_win_loss_partitions() {
        let trades = vec![trade(10.0, 60), trade(-4.0, 30), trade(6.0, 90), trade(0.0, 10)];
        let report = Report::generate(300.0, 312.0, 0.2, trades, vec![]);
        let s = &report.summary;

        assert_eq!(s.total_trades, 4);
        assert_eq!(s.winning_trades, 2);
        // Zero-P&L trades count as losses
        assert_eq!(s.losing_trades, 2);
        assert!((s.win_rate - 50.0).abs() < 1e-9);
        assert!((s.avg_win - 8.0).abs() < 1e-9);
        assert!((s.avg_loss + 4.0).abs() < 1e-9);
        assert!((s.profit_factor - 2.0).abs() < 1e-9);
        assert!((s.avg_holding_minutes - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_totals_come_from_capital_not_trades() {
        let report = Report::generate(300.0, 309.895, 0.105, vec![trade(10.0, 60)], vec![]);
        let s = &report.summary;

        assert!((s.total_pnl - 9.895).abs() < 1e-9);
        assert!((s.total_return_pct - 3.2983).abs() < 1e-3);
        assert!((s.fee_ratio - 0.035).abs() < 1e-9);
    }

    #[test]
    fn test_profit_factor_zero_without_losses() {
        let report = Report::generate(300.0, 310.0, 0.0, vec![trade(10.0, 60)], vec![]);
        assert_eq!(report.summary.profit_factor, 0.0);
    }

    #[test]
    fn test_max_drawdown_single_pass() {
        let curve = vec![
            equity_point(0, 310.0),  // peak
            equity_point(5, 279.0),  // 10% below peak
            equity_point(10, 300.0), // partial recovery
            equity_point(15, 295.0), // smaller drawdown
        ];
        let report = Report::generate(300.0, 295.0, 0.0, vec![trade(-5.0, 10)], curve);

        assert!((report.summary.max_drawdown_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_measured_from_initial_capital() {
        // Curve that only falls: the peak is the starting stake
        let curve = vec![equity_point(0, 270.0), equity_point(5, 240.0)];
        let report = Report::generate(300.0, 240.0, 0.0, vec![trade(-60.0, 10)], curve);

        assert!((report.summary.max_drawdown_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_bounds_every_point() {
        let curve: Vec<EquityPoint> = [310.0, 280.0, 305.0, 290.0, 320.0, 260.0]
            .iter()
            .enumerate()
            .map(|(i, &e)| equity_point(i as i64 * 5, e))
            .collect();
        let report = Report::generate(300.0, 260.0, 0.0, vec![trade(-40.0, 30)], curve.clone());

        let reported = report.summary.max_drawdown_pct;
        let mut peak: f64 = 300.0;
        let mut attained = false;
        for point in &curve {
            peak = peak.max(point.equity);
            let dd = (peak - point.equity) / peak * 100.0;
            assert!(reported >= dd - 1e-9);
            if (reported - dd).abs() < 1e-9 {
                attained = true;
            }
        }
        assert!(attained, "max drawdown must be attained by some point");
    }

    #[test]
    fn test_report_serializes() {
        let report = Report::generate(300.0, 310.0, 0.1, vec![trade(10.0, 60)], vec![]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"win_rate\""));
        // message is omitted when absent
        assert!(!json.contains("\"message\""));
    }
}
