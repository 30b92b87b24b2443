//! Boundary to the wire-level client library.
//!
//! The coordinator only needs connect / status / execute and the three
//! transaction primitives; everything protocol-specific lives behind
//! `RemoteDriver` and `RemoteConnection`.

use emberlink_common::{ServerOptions, UserMappingOptions};
use emberlink_common::encoding::client_encoding;
use secrecy::SecretString;
use thiserror::Error;

/// Everything needed to (re)open a session to one remote database.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// `address[/port]:database`
    pub db_path: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub client_encoding: String,
}

impl ConnectParams {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            user: None,
            password: None,
            client_encoding: "UTF8".to_string(),
        }
    }

    pub fn from_config(
        server: &ServerOptions,
        mapping: Option<&UserMappingOptions>,
        local_encoding: &str,
    ) -> Self {
        Self {
            db_path: server.db_path(),
            user: mapping.and_then(|m| m.username.clone()),
            password: mapping.and_then(|m| m.password.clone()),
            client_encoding: client_encoding(local_encoding),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Bad,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("{0}")]
    Connect(String),

    /// Diagnostic text reported by the remote engine
    #[error("{0}")]
    Remote(String),

    #[error("connection is closed")]
    Closed,
}

/// A single value of a remote result row.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

pub type RemoteRow = Vec<RemoteValue>;

pub trait RemoteConnection {
    fn status(&self) -> ConnectionStatus;

    /// Parameters this connection was opened with.
    fn params(&self) -> &ConnectParams;

    /// Remote engine version as an integer, e.g. `30010`.
    fn server_version(&self) -> i32;

    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;

    fn query(&mut self, sql: &str) -> Result<Vec<RemoteRow>, DriverError>;

    /// Start a read-consistent snapshot transaction.
    fn begin(&mut self) -> Result<(), DriverError>;

    fn commit(&mut self) -> Result<(), DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;

    fn close(&mut self);
}

pub trait RemoteDriver {
    type Connection: RemoteConnection;

    fn connect(&self, params: &ConnectParams) -> Result<Self::Connection, DriverError>;
}
