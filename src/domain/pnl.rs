//! Per-trade P&L and max-loss formulas.
//!
//! All functions are total: absent numeric fields arrive here already coerced
//! to 0 (1 for contracts) by the input boundary.

use super::trade::{Strategy, Trade};

/// Shares per options contract. A domain constant, not configurable.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// P&L on a settled position: (premium received - cost to close) per share,
/// scaled by contract size, minus the flat commission.
pub fn realized_pnl(trade: &Trade) -> f64 {
    (trade.premium_received - trade.close_price) * CONTRACT_MULTIPLIER * trade.contracts as f64
        - trade.commission
}

/// Mark-to-market P&L on an open position, using the user-supplied mark.
pub fn unrealized_pnl(trade: &Trade) -> f64 {
    (trade.premium_received - trade.current_price) * CONTRACT_MULTIPLIER * trade.contracts as f64
        - trade.commission
}

/// Worst-case loss for the trade's strategy.
///
/// Spread strategies risk the strike width less the credit; Wheel and
/// Covered Call risk the posted collateral. Negative results (credit wider
/// than the spread) are preserved, not clamped.
pub fn max_loss(trade: &Trade) -> f64 {
    let contracts = trade.contracts as f64;
    match trade.strategy {
        Strategy::BullPutSpread | Strategy::BearCallSpread => {
            let width = (trade.short_strike - trade.long_strike).abs();
            (width - trade.premium_received) * CONTRACT_MULTIPLIER * contracts
        }
        Strategy::IronCondor => {
            let put_width = (trade.short_strike - trade.long_strike).abs();
            let call_width = (trade.long_call_strike - trade.short_call_strike).abs();
            (put_width.max(call_width) - trade.premium_received) * CONTRACT_MULTIPLIER * contracts
        }
        Strategy::Wheel | Strategy::CoveredCall => trade.collateral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeStatus;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn sample_trade(strategy: Strategy) -> Trade {
        Trade {
            id: "t1".into(),
            underlying: "SPY".into(),
            strategy,
            status: TradeStatus::Open,
            open_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expiration_date: None,
            close_date: None,
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
            realized_pnl: 0.0,
            notes: String::new(),
            tags: String::new(),
        }
    }

    #[test]
    fn realized_pnl_basic() {
        let mut trade = sample_trade(Strategy::BullPutSpread);
        trade.premium_received = 1.5;
        trade.close_price = 0.5;
        trade.commission = 2.0;
        assert_relative_eq!(realized_pnl(&trade), 98.0);
    }

    #[test]
    fn realized_pnl_scales_with_contracts_but_commission_does_not() {
        let mut trade = sample_trade(Strategy::BullPutSpread);
        trade.premium_received = 2.0;
        trade.close_price = 1.0;
        trade.commission = 5.0;
        let single = realized_pnl(&trade);

        trade.contracts = 2;
        let double = realized_pnl(&trade);

        // (p - c) * 100 doubles; the flat commission is per-trade.
        assert_relative_eq!(single, 95.0);
        assert_relative_eq!(double, 195.0);
    }

    #[test]
    fn unrealized_pnl_uses_current_price() {
        let mut trade = sample_trade(Strategy::Wheel);
        trade.premium_received = 3.0;
        trade.current_price = 1.25;
        trade.contracts = 2;
        assert_relative_eq!(unrealized_pnl(&trade), 350.0);
    }

    #[test]
    fn unrealized_pnl_can_be_negative() {
        let mut trade = sample_trade(Strategy::BearCallSpread);
        trade.premium_received = 1.0;
        trade.current_price = 2.5;
        assert_relative_eq!(unrealized_pnl(&trade), -150.0);
    }

    #[test]
    fn max_loss_bull_put_spread() {
        let mut trade = sample_trade(Strategy::BullPutSpread);
        trade.short_strike = 450.0;
        trade.long_strike = 445.0;
        trade.premium_received = 1.2;
        trade.contracts = 3;
        assert_relative_eq!(max_loss(&trade), 1140.0);
    }

    #[test]
    fn max_loss_bear_call_spread_uses_absolute_width() {
        let mut trade = sample_trade(Strategy::BearCallSpread);
        // Strikes entered in either order give the same width.
        trade.short_strike = 200.0;
        trade.long_strike = 210.0;
        trade.premium_received = 2.0;
        assert_relative_eq!(max_loss(&trade), 800.0);

        std::mem::swap(&mut trade.short_strike, &mut trade.long_strike);
        assert_relative_eq!(max_loss(&trade), 800.0);
    }

    #[test]
    fn max_loss_iron_condor_takes_wider_side() {
        let mut trade = sample_trade(Strategy::IronCondor);
        trade.short_strike = 440.0;
        trade.long_strike = 435.0; // put width 5
        trade.short_call_strike = 460.0;
        trade.long_call_strike = 470.0; // call width 10
        trade.premium_received = 2.5;
        trade.contracts = 2;
        assert_relative_eq!(max_loss(&trade), 1500.0);
    }

    #[test]
    fn max_loss_wheel_is_collateral() {
        let mut trade = sample_trade(Strategy::Wheel);
        trade.collateral = 45_000.0;
        trade.short_strike = 450.0; // ignored for collateral strategies
        assert_relative_eq!(max_loss(&trade), 45_000.0);

        trade.strategy = Strategy::CoveredCall;
        assert_relative_eq!(max_loss(&trade), 45_000.0);
    }

    #[test]
    fn max_loss_negative_when_credit_exceeds_width_is_preserved() {
        let mut trade = sample_trade(Strategy::BullPutSpread);
        trade.short_strike = 100.0;
        trade.long_strike = 99.0;
        trade.premium_received = 1.5;
        assert_relative_eq!(max_loss(&trade), -50.0);
    }
}
