//! Trade repository port trait.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;

/// CRUD contract shared by every storage backend. Records are keyed by their
/// opaque id; `list_trades` returns newest open date first.
pub trait TradePort {
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError>;

    fn get_trade(&self, id: &str) -> Result<Option<Trade>, JournalError>;

    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError>;

    /// Full-record update keyed by `trade.id`. Fails with
    /// [`JournalError::TradeNotFound`] when the id is unknown.
    fn update_trade(&self, trade: &Trade) -> Result<(), JournalError>;

    fn delete_trade(&self, id: &str) -> Result<(), JournalError>;
}
