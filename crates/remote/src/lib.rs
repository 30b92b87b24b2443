//! Remote connections and transactions for emberlink.
//!
//! - **Connection Cache**: one lazily opened connection per (server, user) (`cache`).
//! - **Transaction Coordinator**: remote transactions and savepoints that follow the local ones (`coordinator`).
//! - **Session**: config-driven access used by scans and modifications (`session`).
pub mod cache;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod session;
pub mod testing;

pub use cache::{ConnectionCache, ConnectionEntry, ConnectionKey};
pub use coordinator::{SubXactEvent, XactEvent};
pub use driver::{
    ConnectParams, ConnectionStatus, DriverError, RemoteConnection, RemoteDriver, RemoteRow,
    RemoteValue,
};
pub use error::RemoteError;
pub use session::{FetchedRow, RemoteSession, RowIdentifier};
