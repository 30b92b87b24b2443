//! Shared entry point used by scans and modifications.
//!
//! The cache is session-scoped and single-threaded in spirit; the mutex
//! only makes a `RemoteSession` safe to hand to more than one caller.

use std::sync::{Mutex, MutexGuard, PoisonError};

use emberlink_common::AppConfig;
use emberlink_error::Result;
use emberlink_sql::expr::AttrNumber;
use emberlink_sql::{RemoteStatement, RetrievedAttr};

use crate::cache::{ConnectionCache, ConnectionKey};
use crate::coordinator::{SubXactEvent, XactEvent};
use crate::driver::{ConnectParams, RemoteConnection, RemoteDriver, RemoteValue};
use crate::error::RemoteError;

/// Opaque remote row identity, used to address rows for UPDATE / DELETE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowIdentifier(pub Vec<u8>);

/// One fetched row with values keyed by local column number.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    pub values: Vec<(AttrNumber, RemoteValue)>,
    pub row_identity: Option<RowIdentifier>,
}

impl FetchedRow {
    pub fn value(&self, attnum: AttrNumber) -> Option<&RemoteValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == attnum)
            .map(|(_, v)| v)
    }
}

pub struct RemoteSession<D: RemoteDriver> {
    config: AppConfig,
    cache: Mutex<ConnectionCache<D>>,
}

impl<D: RemoteDriver> RemoteSession<D> {
    pub fn new(driver: D, config: AppConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(ConnectionCache::new(driver)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connect_params(&self, server: &str, user: &str) -> Result<ConnectParams> {
        let server_config = self.config.server(server)?;
        let mapping = self.config.user_mapping(server, user)?;
        Ok(ConnectParams::from_config(
            &server_config.options,
            Some(&mapping.options),
            &self.config.local_encoding,
        ))
    }

    /// Run `f` against the connection for (`server`, `user`) with a remote
    /// transaction open to `nest_level`.
    pub fn with_connection<T, F>(&self, server: &str, user: &str, nest_level: u32, f: F) -> Result<T>
    where
        F: FnOnce(&mut D::Connection) -> std::result::Result<T, RemoteError>,
    {
        let params = self.connect_params(server, user)?;
        let key = ConnectionKey::new(server, user);
        let mut cache = self.lock();
        let conn = cache.acquire(&key, &params, nest_level)?;
        Ok(f(conn)?)
    }

    pub fn server_version(&self, server: &str, user: &str, nest_level: u32) -> Result<i32> {
        self.with_connection(server, user, nest_level, |conn| Ok(conn.server_version()))
    }

    /// Run a statement and map each result row onto local column numbers.
    pub fn fetch(
        &self,
        server: &str,
        user: &str,
        nest_level: u32,
        statement: &RemoteStatement,
    ) -> Result<Vec<FetchedRow>> {
        self.with_connection(server, user, nest_level, |conn| {
            tracing::debug!(target: "remote_xact", sql = %statement, "Fetching from remote");
            let rows = conn
                .query(statement.text())
                .map_err(|source| RemoteError::statement(statement.text(), source))?;
            rows.into_iter()
                .map(|row| map_row(statement.retrieved(), row))
                .collect()
        })
    }

    /// Run a statement that returns no rows.
    pub fn execute(
        &self,
        server: &str,
        user: &str,
        nest_level: u32,
        statement: &RemoteStatement,
    ) -> Result<u64> {
        self.with_connection(server, user, nest_level, |conn| {
            conn.execute(statement.text())
                .map_err(|source| RemoteError::statement(statement.text(), source))
        })
    }

    pub fn on_xact_event(&self, event: XactEvent) -> Result<()> {
        Ok(self.lock().on_xact_event(event)?)
    }

    pub fn on_subxact_event(&self, event: SubXactEvent, level: u32) -> Result<()> {
        Ok(self.lock().on_subxact_event(event, level)?)
    }

    pub fn release_all(&self, verbose: bool) -> usize {
        self.lock().release_all(verbose)
    }

    pub fn count_live(&self) -> usize {
        self.lock().count_live()
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionCache<D>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn map_row(
    retrieved: &[RetrievedAttr],
    row: Vec<RemoteValue>,
) -> std::result::Result<FetchedRow, RemoteError> {
    if row.len() != retrieved.len() {
        return Err(RemoteError::ResultShape {
            expected: retrieved.len(),
            actual: row.len(),
        });
    }

    let mut fetched = FetchedRow {
        values: Vec::with_capacity(row.len()),
        row_identity: None,
    };
    for (attr, value) in retrieved.iter().zip(row) {
        match attr {
            RetrievedAttr::Column(attnum) => fetched.values.push((*attnum, value)),
            RetrievedAttr::RowIdentity => match value {
                RemoteValue::Bytes(bytes) => fetched.row_identity = Some(RowIdentifier(bytes)),
                _ => return Err(RemoteError::RowIdentity),
            },
            RetrievedAttr::Placeholder => {}
        }
    }
    Ok(fetched)
}
