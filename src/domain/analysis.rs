//! Group-by breakdowns over the trade list.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::trade::Trade;

/// Per-group statistics. `count` covers every trade in the group; the P&L
/// and win/loss figures are restricted to closed and expired trades, with
/// the same zero-counts-as-loss tie-break as the portfolio metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: String,
    pub count: usize,
    pub total_pnl: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

/// Breakdown by ticker symbol, best cumulative P&L first.
pub fn analyze_by_underlying(trades: &[Trade]) -> Vec<GroupStats> {
    analyze_by(trades, |t| t.underlying.clone())
}

/// Breakdown by strategy, best cumulative P&L first.
pub fn analyze_by_strategy(trades: &[Trade]) -> Vec<GroupStats> {
    analyze_by(trades, |t| t.strategy.to_string())
}

fn analyze_by(trades: &[Trade], key_of: impl Fn(&Trade) -> String) -> Vec<GroupStats> {
    let mut groups: Vec<GroupStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for trade in trades {
        let key = key_of(trade);
        let i = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(GroupStats {
                key,
                count: 0,
                total_pnl: 0.0,
                wins: 0,
                losses: 0,
                win_rate: 0.0,
            });
            groups.len() - 1
        });

        groups[i].count += 1;
        if trade.is_closed() {
            groups[i].total_pnl += trade.realized_pnl;
            if trade.realized_pnl > 0.0 {
                groups[i].wins += 1;
            } else {
                groups[i].losses += 1;
            }
        }
    }

    for group in &mut groups {
        let settled = group.wins + group.losses;
        group.win_rate = if settled > 0 {
            group.wins as f64 / settled as f64 * 100.0
        } else {
            0.0
        };
    }

    // Stable sort: ties keep first-occurrence order.
    groups.sort_by(|a, b| {
        b.total_pnl
            .partial_cmp(&a.total_pnl)
            .unwrap_or(Ordering::Equal)
    });
    groups
}
