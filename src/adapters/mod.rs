//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod json_store;
#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
