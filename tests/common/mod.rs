#![allow(dead_code)]

use optjournal::domain::error::JournalError;
use optjournal::domain::trade::{Trade, TradeInput};
use optjournal::ports::settings_port::SettingsPort;
use optjournal::ports::trade_port::TradePort;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory store for exercising the engine without a database.
#[derive(Default)]
pub struct MemoryStore {
    trades: RefCell<Vec<Trade>>,
    settings: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trades(trades: Vec<Trade>) -> Self {
        Self {
            trades: RefCell::new(trades),
            settings: RefCell::new(HashMap::new()),
        }
    }
}

impl TradePort for MemoryStore {
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let mut trades = self.trades.borrow().clone();
        trades.sort_by(|a, b| b.open_date.cmp(&a.open_date).then(a.id.cmp(&b.id)));
        Ok(trades)
    }

    fn get_trade(&self, id: &str) -> Result<Option<Trade>, JournalError> {
        Ok(self.trades.borrow().iter().find(|t| t.id == id).cloned())
    }

    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        self.trades.borrow_mut().push(trade.clone());
        Ok(())
    }

    fn update_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let mut trades = self.trades.borrow_mut();
        match trades.iter_mut().find(|t| t.id == trade.id) {
            Some(slot) => {
                *slot = trade.clone();
                Ok(())
            }
            None => Err(JournalError::TradeNotFound {
                id: trade.id.clone(),
            }),
        }
    }

    fn delete_trade(&self, id: &str) -> Result<(), JournalError> {
        self.trades.borrow_mut().retain(|t| t.id != id);
        Ok(())
    }
}

impl SettingsPort for MemoryStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>, JournalError> {
        Ok(self.settings.borrow().get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), JournalError> {
        self.settings
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A closed bull put spread with the given realized outcome.
pub fn closed_spread(id: &str, close_date: &str, premium: f64, close_price: f64) -> Trade {
    let input = TradeInput {
        underlying: Some("SPY".into()),
        strategy: Some("Bull Put Spread".into()),
        status: Some("closed".into()),
        open_date: Some("2024-01-02".into()),
        close_date: Some(close_date.into()),
        short_strike: Some("450".into()),
        long_strike: Some("445".into()),
        premium_received: Some(premium.to_string()),
        close_price: Some(close_price.to_string()),
        ..TradeInput::default()
    };
    input.build(id.into()).unwrap()
}

/// An open trade with an optional mark price.
pub fn open_spread(id: &str, open_date: &str, premium: f64, current_price: f64) -> Trade {
    let input = TradeInput {
        underlying: Some("QQQ".into()),
        strategy: Some("Bear Call Spread".into()),
        open_date: Some(open_date.into()),
        short_strike: Some("400".into()),
        long_strike: Some("405".into()),
        premium_received: Some(premium.to_string()),
        current_price: Some(current_price.to_string()),
        ..TradeInput::default()
    };
    input.build(id.into()).unwrap()
}
