//! SQLite storage adapter for trades and settings.

use crate::domain::error::JournalError;
use crate::domain::trade::{Strategy, Trade, TradeStatus};
use crate::ports::config_port::ConfigPort;
use crate::ports::settings_port::SettingsPort;
use crate::ports::trade_port::TradePort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};

const TRADE_COLUMNS: &str = "id, underlying, strategy, status, open_date, expiration_date, \
     close_date, contracts, short_strike, long_strike, short_call_strike, long_call_strike, \
     premium_received, premium_paid, commission, close_price, current_price, collateral, \
     max_loss, realized_pnl, notes, tags";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| JournalError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                underlying TEXT NOT NULL,
                strategy TEXT NOT NULL,
                status TEXT NOT NULL,
                open_date TEXT NOT NULL,
                expiration_date TEXT,
                close_date TEXT,
                contracts INTEGER NOT NULL DEFAULT 1,
                short_strike REAL NOT NULL DEFAULT 0,
                long_strike REAL NOT NULL DEFAULT 0,
                short_call_strike REAL NOT NULL DEFAULT 0,
                long_call_strike REAL NOT NULL DEFAULT 0,
                premium_received REAL NOT NULL DEFAULT 0,
                premium_paid REAL NOT NULL DEFAULT 0,
                commission REAL NOT NULL DEFAULT 0,
                close_price REAL NOT NULL DEFAULT 0,
                current_price REAL NOT NULL DEFAULT 0,
                collateral REAL NOT NULL DEFAULT 0,
                max_loss REAL NOT NULL DEFAULT 0,
                realized_pnl REAL NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status);
            CREATE INDEX IF NOT EXISTS idx_trades_open_date ON trades(open_date);
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

fn parse_sql_date(column: usize, raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn trade_from_row(row: &Row<'_>) -> Result<Trade, rusqlite::Error> {
    let strategy_str: String = row.get(2)?;
    let strategy: Strategy = strategy_str.parse().map_err(|e: JournalError| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_str: String = row.get(3)?;
    let status: TradeStatus = status_str.parse().map_err(|e: JournalError| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let open_date_str: String = row.get(4)?;
    let expiration_str: Option<String> = row.get(5)?;
    let close_str: Option<String> = row.get(6)?;
    let contracts: i64 = row.get(7)?;

    Ok(Trade {
        id: row.get(0)?,
        underlying: row.get(1)?,
        strategy,
        status,
        open_date: parse_sql_date(4, &open_date_str)?,
        expiration_date: expiration_str
            .map(|s| parse_sql_date(5, &s))
            .transpose()?,
        close_date: close_str.map(|s| parse_sql_date(6, &s)).transpose()?,
        contracts: contracts as u32,
        short_strike: row.get(8)?,
        long_strike: row.get(9)?,
        short_call_strike: row.get(10)?,
        long_call_strike: row.get(11)?,
        premium_received: row.get(12)?,
        premium_paid: row.get(13)?,
        commission: row.get(14)?,
        close_price: row.get(15)?,
        current_price: row.get(16)?,
        collateral: row.get(17)?,
        max_loss: row.get(18)?,
        realized_pnl: row.get(19)?,
        notes: row.get(20)?,
        tags: row.get(21)?,
    })
}

fn date_param(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

impl TradePort for SqliteAdapter {
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let query =
            format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY open_date DESC, id ASC");
        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map([], |row| trade_from_row(row))
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(
                row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(trades)
    }

    fn get_trade(&self, id: &str) -> Result<Option<Trade>, JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1");
        conn.query_row(&query, params![id], |row| trade_from_row(row))
            .optional()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let query = format!(
            "INSERT INTO trades ({TRADE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20, ?21, ?22)"
        );
        conn.execute(
            &query,
            params![
                trade.id,
                trade.underlying,
                trade.strategy.as_str(),
                trade.status.as_str(),
                trade.open_date.format("%Y-%m-%d").to_string(),
                date_param(trade.expiration_date),
                date_param(trade.close_date),
                trade.contracts as i64,
                trade.short_strike,
                trade.long_strike,
                trade.short_call_strike,
                trade.long_call_strike,
                trade.premium_received,
                trade.premium_paid,
                trade.commission,
                trade.close_price,
                trade.current_price,
                trade.collateral,
                trade.max_loss,
                trade.realized_pnl,
                trade.notes,
                trade.tags
            ],
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn update_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let affected = conn
            .execute(
                "UPDATE trades SET underlying = ?2, strategy = ?3, status = ?4, open_date = ?5,
                    expiration_date = ?6, close_date = ?7, contracts = ?8, short_strike = ?9,
                    long_strike = ?10, short_call_strike = ?11, long_call_strike = ?12,
                    premium_received = ?13, premium_paid = ?14, commission = ?15,
                    close_price = ?16, current_price = ?17, collateral = ?18, max_loss = ?19,
                    realized_pnl = ?20, notes = ?21, tags = ?22
                 WHERE id = ?1",
                params![
                    trade.id,
                    trade.underlying,
                    trade.strategy.as_str(),
                    trade.status.as_str(),
                    trade.open_date.format("%Y-%m-%d").to_string(),
                    date_param(trade.expiration_date),
                    date_param(trade.close_date),
                    trade.contracts as i64,
                    trade.short_strike,
                    trade.long_strike,
                    trade.short_call_strike,
                    trade.long_call_strike,
                    trade.premium_received,
                    trade.premium_paid,
                    trade.commission,
                    trade.close_price,
                    trade.current_price,
                    trade.collateral,
                    trade.max_loss,
                    trade.realized_pnl,
                    trade.notes,
                    trade.tags
                ],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        if affected == 0 {
            return Err(JournalError::TradeNotFound {
                id: trade.id.clone(),
            });
        }
        Ok(())
    }

    fn delete_trade(&self, id: &str) -> Result<(), JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        conn.execute("DELETE FROM trades WHERE id = ?1", params![id])
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl SettingsPort for SqliteAdapter {
    fn get_setting(&self, key: &str) -> Result<Option<String>, JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), JournalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn sample_trade(id: &str, underlying: &str, open_date: &str) -> Trade {
        Trade {
            id: id.into(),
            underlying: underlying.into(),
            strategy: Strategy::BullPutSpread,
            status: TradeStatus::Open,
            open_date: NaiveDate::parse_from_str(open_date, "%Y-%m-%d").unwrap(),
            expiration_date: NaiveDate::from_ymd_opt(2024, 4, 19),
            close_date: None,
            contracts: 2,
            short_strike: 450.0,
            long_strike: 445.0,
            short_call_strike: 0.0,
            long_call_strike: 0.0,
            premium_received: 1.2,
            premium_paid: 0.0,
            commission: 1.3,
            close_price: 0.0,
            current_price: 0.8,
            collateral: 0.0,
            max_loss: 760.0,
            realized_pnl: 0.0,
            notes: "earnings week".into(),
            tags: "weekly".into(),
        }
    }

    fn fresh_adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(JournalError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let adapter = fresh_adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn create_and_get_round_trips_all_fields() {
        let adapter = fresh_adapter();
        let trade = sample_trade("t1", "SPY", "2024-03-01");
        adapter.create_trade(&trade).unwrap();

        let fetched = adapter.get_trade("t1").unwrap().unwrap();
        assert_eq!(fetched, trade);
    }

    #[test]
    fn get_missing_trade_returns_none() {
        let adapter = fresh_adapter();
        assert!(adapter.get_trade("nope").unwrap().is_none());
    }

    #[test]
    fn list_orders_by_open_date_descending() {
        let adapter = fresh_adapter();
        adapter
            .create_trade(&sample_trade("older", "SPY", "2024-01-10"))
            .unwrap();
        adapter
            .create_trade(&sample_trade("newer", "QQQ", "2024-03-10"))
            .unwrap();

        let trades = adapter.list_trades().unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, "newer");
        assert_eq!(trades[1].id, "older");
    }

    #[test]
    fn update_existing_trade() {
        let adapter = fresh_adapter();
        let mut trade = sample_trade("t1", "SPY", "2024-03-01");
        adapter.create_trade(&trade).unwrap();

        trade.status = TradeStatus::Closed;
        trade.close_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        trade.close_price = 0.3;
        trade.realized_pnl = 178.7;
        adapter.update_trade(&trade).unwrap();

        let fetched = adapter.get_trade("t1").unwrap().unwrap();
        assert_eq!(fetched.status, TradeStatus::Closed);
        assert_eq!(fetched.close_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert!((fetched.realized_pnl - 178.7).abs() < 1e-9);
    }

    #[test]
    fn update_unknown_trade_fails() {
        let adapter = fresh_adapter();
        let trade = sample_trade("ghost", "SPY", "2024-03-01");
        let result = adapter.update_trade(&trade);
        assert!(matches!(
            result,
            Err(JournalError::TradeNotFound { id }) if id == "ghost"
        ));
    }

    #[test]
    fn delete_trade_removes_record() {
        let adapter = fresh_adapter();
        adapter
            .create_trade(&sample_trade("t1", "SPY", "2024-03-01"))
            .unwrap();
        adapter.delete_trade("t1").unwrap();
        assert!(adapter.get_trade("t1").unwrap().is_none());
    }

    #[test]
    fn settings_get_missing_returns_none() {
        let adapter = fresh_adapter();
        assert!(adapter.get_setting("base_capital").unwrap().is_none());
    }

    #[test]
    fn settings_set_then_overwrite() {
        let adapter = fresh_adapter();
        adapter.set_setting("base_capital", "21000").unwrap();
        adapter.set_setting("base_capital", "30000").unwrap();
        assert_eq!(
            adapter.get_setting("base_capital").unwrap().as_deref(),
            Some("30000")
        );
    }
}
