//! Equity curve construction and monthly P&L rollup.

use std::collections::BTreeMap;

use serde::Serialize;

use super::trade::{Strategy, Trade};

/// Label of the synthetic starting point of every equity curve.
pub const START_LABEL: &str = "Start";

/// One point on the equity curve. The first point is synthetic (base capital,
/// zero P&L); subsequent points carry the settling trade's annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub label: String,
    pub equity: f64,
    pub pnl: f64,
    pub underlying: Option<String>,
    pub strategy: Option<Strategy>,
}

/// Cumulative capital trajectory as closed trades settle.
///
/// Only closed or expired trades with a close date qualify; they are sorted
/// ascending by close date, preserving input order for equal dates. Closed
/// trades without a close date still count in the win/loss aggregates of
/// [`super::metrics::PortfolioMetrics`] but are absent here.
pub fn build_equity_curve(trades: &[Trade], base_capital: f64) -> Vec<EquityPoint> {
    let mut settled: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.is_closed() && t.close_date.is_some())
        .collect();
    settled.sort_by_key(|t| t.close_date);

    let mut curve = Vec::with_capacity(settled.len() + 1);
    curve.push(EquityPoint {
        label: START_LABEL.to_string(),
        equity: base_capital,
        pnl: 0.0,
        underlying: None,
        strategy: None,
    });

    let mut cumulative = base_capital;
    for trade in settled {
        cumulative += trade.realized_pnl;
        let label = trade
            .close_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        curve.push(EquityPoint {
            label,
            equity: cumulative,
            pnl: trade.realized_pnl,
            underlying: Some(trade.underlying.clone()),
            strategy: Some(trade.strategy),
        });
    }

    curve
}

/// Realized P&L summed per calendar month of the close date.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPnl {
    /// `YYYY-MM` key.
    pub month: String,
    pub pnl: f64,
}

/// Closed-set trades with a close date, grouped by year-month, ascending.
pub fn monthly_pnl(trades: &[Trade]) -> Vec<MonthlyPnl> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for trade in trades {
        if !trade.is_closed() {
            continue;
        }
        if let Some(date) = trade.close_date {
            *months.entry(date.format("%Y-%m").to_string()).or_insert(0.0) += trade.realized_pnl;
        }
    }
    months
        .into_iter()
        .map(|(month, pnl)| MonthlyPnl { month, pnl })
        .collect()
}
