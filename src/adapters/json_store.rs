//! JSON export/import of the trade list.
//!
//! The file format is a plain JSON array of trade records, the same shape
//! the journal's remote table store serves.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;
use std::fs;
use std::path::Path;

pub fn export_trades(trades: &[Trade], path: &Path) -> Result<(), JournalError> {
    let json =
        serde_json::to_string_pretty(trades).map_err(|e| JournalError::Serialization {
            reason: e.to_string(),
        })?;
    fs::write(path, json)?;
    Ok(())
}

pub fn import_trades(path: &Path) -> Result<Vec<Trade>, JournalError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| JournalError::Serialization {
        reason: e.to_string(),
    })
}
