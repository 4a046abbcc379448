//! Port traits bridging domain and adapters.

pub mod config_port;
pub mod settings_port;
pub mod trade_port;

use settings_port::SettingsPort;
use trade_port::TradePort;

/// A storage backend serves both the trade repository and the settings table.
pub trait JournalStore: TradePort + SettingsPort {}

impl<T: TradePort + SettingsPort> JournalStore for T {}
