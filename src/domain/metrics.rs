//! Portfolio-level aggregate metrics.

use super::pnl;
use super::trade::Trade;

/// Immutable snapshot of portfolio performance, fully recomputed from the
/// trade list on every call.
///
/// Rates are percentages (0-100). Wins and losses are judged on the stored
/// `realized_pnl` of closed and expired trades; a zero-P&L trade counts as a
/// loss, not a push. Unrealized P&L is recomputed live from each open trade's
/// mark rather than read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioMetrics {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_realized_pnl: f64,
    pub total_unrealized_pnl: f64,
    pub total_pnl: f64,
    pub return_on_capital: f64,
    pub base_capital: f64,
    pub current_capital: f64,
    pub total_collateral: f64,
    pub available_capital: f64,
}

impl PortfolioMetrics {
    pub fn compute(trades: &[Trade], base_capital: f64) -> Self {
        let mut open_trades = 0usize;
        let mut closed_trades = 0usize;
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_realized_pnl = 0.0_f64;
        let mut total_unrealized_pnl = 0.0_f64;
        let mut total_collateral = 0.0_f64;

        for trade in trades {
            if trade.is_closed() {
                closed_trades += 1;
                total_realized_pnl += trade.realized_pnl;
                if trade.realized_pnl > 0.0 {
                    wins += 1;
                    total_wins += trade.realized_pnl;
                } else {
                    losses += 1;
                    total_losses += trade.realized_pnl;
                }
            } else {
                open_trades += 1;
                total_unrealized_pnl += pnl::unrealized_pnl(trade);
                total_collateral += trade.collateral;
            }
        }
        let total_losses = total_losses.abs();

        let win_rate = if closed_trades > 0 {
            wins as f64 / closed_trades as f64 * 100.0
        } else {
            0.0
        };

        // Division by zero is a defined outcome, not an error.
        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if wins > 0 { total_wins / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        let return_on_capital = if base_capital > 0.0 {
            total_realized_pnl / base_capital * 100.0
        } else {
            0.0
        };

        let current_capital = base_capital + total_realized_pnl;

        PortfolioMetrics {
            total_trades: trades.len(),
            open_trades,
            closed_trades,
            wins,
            losses,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            total_realized_pnl,
            total_unrealized_pnl,
            total_pnl: total_realized_pnl + total_unrealized_pnl,
            return_on_capital,
            base_capital,
            current_capital,
            total_collateral,
            available_capital: current_capital - total_collateral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{Strategy, TradeStatus};
    use chrono::NaiveDate;

    fn closed_trade(realized_pnl: f64) -> Trade {
        Trade {
            id: format!("t{realized_pnl}"),
            underlying: "SPY".into(),
            strategy: Strategy::BullPutSpread,
            status: TradeStatus::Closed,
            open_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            expiration_date: None,
            close_date: Some(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()),
            contracts: 1,
            short_strike: 0.0,
            long_strike: 0.0,
            short_call_strike: 0.0,
            long_call_strike: 0.0,
            premium_received: 0.0,
            premium_paid: 0.0,
            commission: 0.0,
            close_price: 0.0,
            current_price: 0.0,
            collateral: 0.0,
            max_loss: 0.0,
            realized_pnl,
            notes: String::new(),
            tags: String::new(),
        }
    }

    fn open_trade(premium_received: f64, current_price: f64, collateral: f64) -> Trade {
        let mut trade = closed_trade(0.0);
        trade.status = TradeStatus::Open;
        trade.close_date = None;
        trade.premium_received = premium_received;
        trade.current_price = current_price;
        trade.collateral = collateral;
        trade
    }

    #[test]
    fn empty_input_yields_zeroed_snapshot() {
        let metrics = PortfolioMetrics::compute(&[], 50_000.0);
        assert_eq!(metrics.total_trades, 0);
        assert!((metrics.win_rate - 0.0).abs() < f64::EPSILON);
        assert!((metrics.profit_factor - 0.0).abs() < f64::EPSILON);
        assert!((metrics.total_realized_pnl - 0.0).abs() < f64::EPSILON);
        assert!((metrics.current_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((metrics.available_capital - 50_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn worked_example_from_two_closed_trades() {
        let trades = vec![closed_trade(100.0), closed_trade(-50.0)];
        let metrics = PortfolioMetrics::compute(&trades, 1_000.0);

        assert_eq!(metrics.wins, 1);
        assert_eq!(metrics.losses, 1);
        assert!((metrics.win_rate - 50.0).abs() < 1e-9);
        assert!((metrics.profit_factor - 2.0).abs() < 1e-9);
        assert!((metrics.total_realized_pnl - 50.0).abs() < 1e-9);
        assert!((metrics.current_capital - 1_050.0).abs() < 1e-9);
        assert!((metrics.return_on_capital - 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_pnl_counts_as_loss() {
        let trades = vec![closed_trade(0.0)];
        let metrics = PortfolioMetrics::compute(&trades, 1_000.0);
        assert_eq!(metrics.wins, 0);
        assert_eq!(metrics.losses, 1);
        assert!((metrics.win_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn expired_trades_join_the_closed_set() {
        let mut expired = closed_trade(75.0);
        expired.status = TradeStatus::Expired;
        let metrics = PortfolioMetrics::compute(&[expired], 1_000.0);
        assert_eq!(metrics.closed_trades, 1);
        assert_eq!(metrics.wins, 1);
    }

    #[test]
    fn profit_factor_infinite_with_wins_and_no_losses() {
        let trades = vec![closed_trade(100.0)];
        let metrics = PortfolioMetrics::compute(&trades, 1_000.0);
        assert!(metrics.profit_factor.is_infinite());
        assert!(metrics.profit_factor > 0.0);
    }

    #[test]
    fn avg_win_and_avg_loss() {
        let trades = vec![
            closed_trade(100.0),
            closed_trade(200.0),
            closed_trade(-60.0),
            closed_trade(-40.0),
        ];
        let metrics = PortfolioMetrics::compute(&trades, 1_000.0);
        assert!((metrics.avg_win - 150.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 50.0).abs() < 1e-9);
    }

    #[test]
    fn unrealized_pnl_recomputed_from_open_marks() {
        // premium 2.0, mark 0.5 -> +150 unrealized
        let trades = vec![open_trade(2.0, 0.5, 40_000.0), closed_trade(100.0)];
        let metrics = PortfolioMetrics::compute(&trades, 50_000.0);

        assert_eq!(metrics.open_trades, 1);
        assert!((metrics.total_unrealized_pnl - 150.0).abs() < 1e-9);
        assert!((metrics.total_pnl - 250.0).abs() < 1e-9);
        assert!((metrics.total_collateral - 40_000.0).abs() < 1e-9);
        assert!((metrics.current_capital - 50_100.0).abs() < 1e-9);
        assert!((metrics.available_capital - 10_100.0).abs() < 1e-9);
    }

    #[test]
    fn collateral_on_closed_trades_is_ignored() {
        let mut trade = closed_trade(10.0);
        trade.collateral = 5_000.0;
        let metrics = PortfolioMetrics::compute(&[trade], 1_000.0);
        assert!((metrics.total_collateral - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_positive_base_capital_zeroes_return() {
        let trades = vec![closed_trade(100.0)];
        let metrics = PortfolioMetrics::compute(&trades, 0.0);
        assert!((metrics.return_on_capital - 0.0).abs() < f64::EPSILON);
        assert!((metrics.current_capital - 100.0).abs() < 1e-9);
    }
}
