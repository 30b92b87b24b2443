//! Configuration and telemetry shared across emberlink crates.
//!
//! - **Configuration**: servers, user mappings, foreign tables and columns (`config`, `models`).
//! - **Encoding**: local-to-remote client encoding names (`encoding`).
//! - **Telemetry**: logging bootstrap (`telemetry`).
pub mod config;
pub mod encoding;
pub mod models;
pub mod telemetry;

pub use crate::config::{AppConfig, LogConfig};
pub use crate::models::{
    ColumnConfig, ColumnOptions, ForeignTableConfig, ServerConfig, ServerOptions, TableOptions,
    UserMappingConfig, UserMappingOptions,
};
