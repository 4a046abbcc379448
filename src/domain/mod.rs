//! Core domain types and the metrics engine.

pub mod analysis;
pub mod equity;
pub mod error;
pub mod metrics;
pub mod pnl;
pub mod settings;
pub mod trade;
