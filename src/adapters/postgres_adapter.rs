//! PostgreSQL storage adapter, used when a remote backend is configured.

use crate::domain::error::JournalError;
use crate::domain::trade::{Strategy, Trade, TradeStatus};
use crate::ports::config_port::ConfigPort;
use crate::ports::settings_port::SettingsPort;
use crate::ports::trade_port::TradePort;
use chrono::NaiveDate;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};
use std::cell::RefCell;

const TRADE_COLUMNS: &str = "id, underlying, strategy, status, open_date, expiration_date, \
     close_date, contracts, short_strike, long_strike, short_call_strike, long_call_strike, \
     premium_received, premium_paid, commission, close_price, current_price, collateral, \
     max_loss, realized_pnl, notes, tags";

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| JournalError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        self.client
            .borrow_mut()
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS public.trades (
                    id TEXT PRIMARY KEY,
                    underlying TEXT NOT NULL,
                    strategy TEXT NOT NULL,
                    status TEXT NOT NULL,
                    open_date DATE NOT NULL,
                    expiration_date DATE,
                    close_date DATE,
                    contracts INTEGER NOT NULL DEFAULT 1,
                    short_strike DOUBLE PRECISION NOT NULL DEFAULT 0,
                    long_strike DOUBLE PRECISION NOT NULL DEFAULT 0,
                    short_call_strike DOUBLE PRECISION NOT NULL DEFAULT 0,
                    long_call_strike DOUBLE PRECISION NOT NULL DEFAULT 0,
                    premium_received DOUBLE PRECISION NOT NULL DEFAULT 0,
                    premium_paid DOUBLE PRECISION NOT NULL DEFAULT 0,
                    commission DOUBLE PRECISION NOT NULL DEFAULT 0,
                    close_price DOUBLE PRECISION NOT NULL DEFAULT 0,
                    current_price DOUBLE PRECISION NOT NULL DEFAULT 0,
                    collateral DOUBLE PRECISION NOT NULL DEFAULT 0,
                    max_loss DOUBLE PRECISION NOT NULL DEFAULT 0,
                    realized_pnl DOUBLE PRECISION NOT NULL DEFAULT 0,
                    notes TEXT NOT NULL DEFAULT '',
                    tags TEXT NOT NULL DEFAULT ''
                );
                CREATE INDEX IF NOT EXISTS idx_trades_status ON public.trades(status);
                CREATE TABLE IF NOT EXISTS public.settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

fn trade_from_row(row: &Row) -> Result<Trade, JournalError> {
    let strategy: Strategy = row.get::<_, String>(2).parse()?;
    let status: TradeStatus = row.get::<_, String>(3).parse()?;
    let contracts: i32 = row.get(7);

    Ok(Trade {
        id: row.get(0),
        underlying: row.get(1),
        strategy,
        status,
        open_date: row.get::<_, NaiveDate>(4),
        expiration_date: row.get::<_, Option<NaiveDate>>(5),
        close_date: row.get::<_, Option<NaiveDate>>(6),
        contracts: contracts as u32,
        short_strike: row.get(8),
        long_strike: row.get(9),
        short_call_strike: row.get(10),
        long_call_strike: row.get(11),
        premium_received: row.get(12),
        premium_paid: row.get(13),
        commission: row.get(14),
        close_price: row.get(15),
        current_price: row.get(16),
        collateral: row.get(17),
        max_loss: row.get(18),
        realized_pnl: row.get(19),
        notes: row.get(20),
        tags: row.get(21),
    })
}

impl TradePort for PostgresAdapter {
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let query = format!(
            "SELECT {TRADE_COLUMNS} FROM public.trades ORDER BY open_date DESC, id ASC"
        );

        let rows = self
            .client
            .borrow_mut()
            .query(&query, &[])
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        rows.iter().map(trade_from_row).collect()
    }

    fn get_trade(&self, id: &str) -> Result<Option<Trade>, JournalError> {
        let query = format!("SELECT {TRADE_COLUMNS} FROM public.trades WHERE id = $1");

        let rows = self
            .client
            .borrow_mut()
            .query(&query, &[&id])
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        rows.first().map(trade_from_row).transpose()
    }

    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let contracts = trade.contracts as i32;
        let query = format!(
            "INSERT INTO public.trades ({TRADE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22)"
        );
        let strategy = trade.strategy.as_str();
        let status = trade.status.as_str();
        let params: &[&(dyn ToSql + Sync)] = &[
            &trade.id,
            &trade.underlying,
            &strategy,
            &status,
            &trade.open_date,
            &trade.expiration_date,
            &trade.close_date,
            &contracts,
            &trade.short_strike,
            &trade.long_strike,
            &trade.short_call_strike,
            &trade.long_call_strike,
            &trade.premium_received,
            &trade.premium_paid,
            &trade.commission,
            &trade.close_price,
            &trade.current_price,
            &trade.collateral,
            &trade.max_loss,
            &trade.realized_pnl,
            &trade.notes,
            &trade.tags,
        ];

        self.client
            .borrow_mut()
            .execute(&query, params)
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn update_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let contracts = trade.contracts as i32;
        let query = "UPDATE public.trades SET underlying = $2, strategy = $3, status = $4,
                open_date = $5, expiration_date = $6, close_date = $7, contracts = $8,
                short_strike = $9, long_strike = $10, short_call_strike = $11,
                long_call_strike = $12, premium_received = $13, premium_paid = $14,
                commission = $15, close_price = $16, current_price = $17, collateral = $18,
                max_loss = $19, realized_pnl = $20, notes = $21, tags = $22
             WHERE id = $1";
        let strategy = trade.strategy.as_str();
        let status = trade.status.as_str();
        let params: &[&(dyn ToSql + Sync)] = &[
            &trade.id,
            &trade.underlying,
            &strategy,
            &status,
            &trade.open_date,
            &trade.expiration_date,
            &trade.close_date,
            &contracts,
            &trade.short_strike,
            &trade.long_strike,
            &trade.short_call_strike,
            &trade.long_call_strike,
            &trade.premium_received,
            &trade.premium_paid,
            &trade.commission,
            &trade.close_price,
            &trade.current_price,
            &trade.collateral,
            &trade.max_loss,
            &trade.realized_pnl,
            &trade.notes,
            &trade.tags,
        ];

        let affected = self
            .client
            .borrow_mut()
            .execute(query, params)
            .map_err(|e| JournalError::DatabaseQuery {
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
        self.client
            .borrow_mut()
            .execute("DELETE FROM public.trades WHERE id = $1", &[&id])
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl SettingsPort for PostgresAdapter {
    fn get_setting(&self, key: &str) -> Result<Option<String>, JournalError> {
        let rows = self
            .client
            .borrow_mut()
            .query("SELECT value FROM public.settings WHERE key = $1", &[&key])
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(rows.first().map(|row| row.get(0)))
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), JournalError> {
        self.client
            .borrow_mut()
            .execute(
                "INSERT INTO public.settings (key, value) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
                &[&key, &value],
            )
            .map_err(|e| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
