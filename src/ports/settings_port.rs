//! Settings store port trait.

use crate::domain::error::JournalError;

/// Flat string-keyed settings table. `set_setting` upserts.
pub trait SettingsPort {
    fn get_setting(&self, key: &str) -> Result<Option<String>, JournalError>;

    fn set_setting(&self, key: &str, value: &str) -> Result<(), JournalError>;
}
