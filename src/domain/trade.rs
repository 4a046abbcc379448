//! Trade records, strategy/status enumerations, and form-input parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;
use super::pnl;

/// The supported option strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "Bull Put Spread")]
    BullPutSpread,
    #[serde(rename = "Bear Call Spread")]
    BearCallSpread,
    #[serde(rename = "Iron Condor")]
    IronCondor,
    #[serde(rename = "Wheel")]
    Wheel,
    #[serde(rename = "Covered Call")]
    CoveredCall,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::BullPutSpread,
        Strategy::BearCallSpread,
        Strategy::IronCondor,
        Strategy::Wheel,
        Strategy::CoveredCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::BullPutSpread => "Bull Put Spread",
            Strategy::BearCallSpread => "Bear Call Spread",
            Strategy::IronCondor => "Iron Condor",
            Strategy::Wheel => "Wheel",
            Strategy::CoveredCall => "Covered Call",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| JournalError::InvalidField {
                field: "strategy".into(),
                reason: format!("unknown strategy {s:?}"),
            })
    }
}

/// Lifecycle state of a trade. Governs whether realized or unrealized P&L
/// is authoritative; a trade is never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
    Expired,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
            TradeStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            "expired" => Ok(TradeStatus::Expired),
            other => Err(JournalError::InvalidField {
                field: "status".into(),
                reason: format!("unknown status {other:?}"),
            }),
        }
    }
}

/// A single journal entry.
///
/// `max_loss` and `realized_pnl` are derived from the other fields at save
/// time; the engine recomputes aggregates from the stored values rather than
/// re-deriving them per trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub underlying: String,
    pub strategy: Strategy,
    pub status: TradeStatus,
    pub open_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub contracts: u32,
    pub short_strike: f64,
    pub long_strike: f64,
    pub short_call_strike: f64,
    pub long_call_strike: f64,
    pub premium_received: f64,
    pub premium_paid: f64,
    pub commission: f64,
    pub close_price: f64,
    pub current_price: f64,
    pub collateral: f64,
    pub max_loss: f64,
    pub realized_pnl: f64,
    pub notes: String,
    pub tags: String,
}

impl Trade {
    /// Closed and expired trades form the "closed set" for every aggregate.
    pub fn is_closed(&self) -> bool {
        matches!(self.status, TradeStatus::Closed | TradeStatus::Expired)
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Refresh the derived fields after an edit. Realized P&L is zero while
    /// the trade is still open.
    pub fn recompute_derived(&mut self) {
        self.max_loss = pnl::max_loss(self);
        self.realized_pnl = if self.is_open() {
            0.0
        } else {
            pnl::realized_pnl(self)
        };
    }
}

/// Raw form input for a trade, all fields as user-entered text.
///
/// Numeric coercion is deliberately permissive, matching journal-form
/// behavior: absent or malformed numbers become 0 (1 for contracts) rather
/// than errors. Dates, strategy, and status are validated here so the domain
/// formulas stay total.
#[derive(Debug, Clone, Default)]
pub struct TradeInput {
    pub underlying: Option<String>,
    pub strategy: Option<String>,
    pub status: Option<String>,
    pub open_date: Option<String>,
    pub expiration_date: Option<String>,
    pub close_date: Option<String>,
    pub contracts: Option<String>,
    pub short_strike: Option<String>,
    pub long_strike: Option<String>,
    pub short_call_strike: Option<String>,
    pub long_call_strike: Option<String>,
    pub premium_received: Option<String>,
    pub premium_paid: Option<String>,
    pub commission: Option<String>,
    pub close_price: Option<String>,
    pub current_price: Option<String>,
    pub collateral: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

impl TradeInput {
    /// Build a [`Trade`] with the given id, deriving `max_loss` and
    /// `realized_pnl`.
    pub fn build(&self, id: String) -> Result<Trade, JournalError> {
        let underlying = self
            .underlying
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| JournalError::InvalidField {
                field: "underlying".into(),
                reason: "underlying is required".into(),
            })?;

        let strategy: Strategy = self
            .strategy
            .as_deref()
            .ok_or_else(|| JournalError::InvalidField {
                field: "strategy".into(),
                reason: "strategy is required".into(),
            })?
            .parse()?;

        let status: TradeStatus = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => TradeStatus::Open,
        };

        let open_date = parse_date("open_date", self.open_date.as_deref())?.ok_or_else(|| {
            JournalError::InvalidField {
                field: "open_date".into(),
                reason: "open_date is required".into(),
            }
        })?;

        let mut trade = Trade {
            id,
            underlying,
            strategy,
            status,
            open_date,
            expiration_date: parse_date("expiration_date", self.expiration_date.as_deref())?,
            close_date: parse_date("close_date", self.close_date.as_deref())?,
            contracts: contracts_or_one(self.contracts.as_deref()),
            short_strike: num_or_zero(self.short_strike.as_deref()),
            long_strike: num_or_zero(self.long_strike.as_deref()),
            short_call_strike: num_or_zero(self.short_call_strike.as_deref()),
            long_call_strike: num_or_zero(self.long_call_strike.as_deref()),
            premium_received: num_or_zero(self.premium_received.as_deref()),
            premium_paid: num_or_zero(self.premium_paid.as_deref()),
            commission: num_or_zero(self.commission.as_deref()),
            close_price: num_or_zero(self.close_price.as_deref()),
            current_price: num_or_zero(self.current_price.as_deref()),
            collateral: num_or_zero(self.collateral.as_deref()),
            max_loss: 0.0,
            realized_pnl: 0.0,
            notes: self.notes.clone().unwrap_or_default(),
            tags: self.tags.clone().unwrap_or_default(),
        };
        trade.recompute_derived();
        Ok(trade)
    }
}

/// Coerce user-entered text to a number, defaulting to 0.
pub fn num_or_zero(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Contract quantity defaults to 1 when absent, malformed, or non-positive.
pub fn contracts_or_one(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(1)
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, JournalError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| JournalError::InvalidField {
                field: field.into(),
                reason: format!("invalid date {s:?} (expected YYYY-MM-DD)"),
            }),
    }
}
