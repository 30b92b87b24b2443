//! Connection Cache
//!
//! One remote connection per (server, local user) pair, opened lazily on
//! first use and kept for the life of the session. Each entry also carries
//! the remote transaction nesting depth driven by the coordinator.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::coordinator::ensure_open;
use crate::driver::{ConnectParams, ConnectionStatus, RemoteConnection, RemoteDriver};
use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionKey {
    pub server: String,
    pub user: String,
}

impl ConnectionKey {
    pub fn new(server: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

#[derive(Debug)]
pub struct ConnectionEntry<C> {
    pub(crate) conn: Option<C>,
    /// 0 = no remote transaction, 1 = top level, n = (n - 1) open savepoints
    pub(crate) xact_depth: u32,
    /// A subtransaction aborted during the current top-level transaction
    pub(crate) had_error: bool,
}

impl<C> ConnectionEntry<C> {
    fn new() -> Self {
        Self {
            conn: None,
            xact_depth: 0,
            had_error: false,
        }
    }

    pub fn xact_depth(&self) -> u32 {
        self.xact_depth
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection(&self) -> Option<&C> {
        self.conn.as_ref()
    }
}

pub struct ConnectionCache<D: RemoteDriver> {
    driver: D,
    pub(crate) entries: BTreeMap<ConnectionKey, ConnectionEntry<D::Connection>>,
    /// Set once any connection is acquired in the current top-level transaction
    pub(crate) xact_got_connection: bool,
}

impl<D: RemoteDriver> ConnectionCache<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            entries: BTreeMap::new(),
            xact_got_connection: false,
        }
    }

    /// Return a live connection for `key` with a remote transaction open to
    /// at least `nest_level`.
    ///
    /// A connection reported broken is reopened with the parameters it was
    /// first opened with. The remote transaction state is not replayed.
    pub fn acquire(
        &mut self,
        key: &ConnectionKey,
        params: &ConnectParams,
        nest_level: u32,
    ) -> Result<&mut D::Connection, RemoteError> {
        self.xact_got_connection = true;

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(ConnectionEntry::new);

        let conn = match entry.conn.take() {
            None => {
                let conn = open(&self.driver, key, params)?;
                entry.xact_depth = 0;
                entry.had_error = false;
                debug!(
                    target: "connection_cache",
                    %key,
                    db_path = %params.db_path,
                    "New remote connection"
                );
                conn
            }
            Some(mut old) if old.status() == ConnectionStatus::Bad => {
                warn!(
                    target: "connection_cache",
                    %key,
                    "Remote connection has gone away, reconnecting"
                );
                let reopen = old.params().clone();
                match open(&self.driver, key, &reopen) {
                    Ok(fresh) => {
                        old.close();
                        info!(
                            target: "connection_cache",
                            %key,
                            xact_depth = entry.xact_depth,
                            "Reconnected to remote server"
                        );
                        fresh
                    }
                    Err(e) => {
                        entry.conn = Some(old);
                        return Err(e);
                    }
                }
            }
            Some(conn) => conn,
        };

        let conn = entry.conn.insert(conn);
        ensure_open(conn, &mut entry.xact_depth, nest_level, key)?;
        Ok(conn)
    }

    /// Close every live connection. Entries stay in the cache with their
    /// transaction state cleared and reconnect on next use.
    pub fn release_all(&mut self, verbose: bool) -> usize {
        let mut closed = 0;
        for (key, entry) in self.entries.iter_mut() {
            if let Some(mut conn) = entry.conn.take() {
                debug!(target: "connection_cache", %key, "Closing remote connection");
                conn.close();
                entry.xact_depth = 0;
                entry.had_error = false;
                closed += 1;
            }
        }
        if verbose {
            info!(target: "connection_cache", closed, "{} cached connections closed", closed);
        }
        closed
    }

    pub fn count_live(&self) -> usize {
        self.entries.values().filter(|e| e.is_connected()).count()
    }

    pub fn entry(&self, key: &ConnectionKey) -> Option<&ConnectionEntry<D::Connection>> {
        self.entries.get(key)
    }

    pub fn xact_got_connection(&self) -> bool {
        self.xact_got_connection
    }
}

impl<D: RemoteDriver> Drop for ConnectionCache<D> {
    fn drop(&mut self) {
        self.release_all(false);
    }
}

fn open<D: RemoteDriver>(
    driver: &D,
    key: &ConnectionKey,
    params: &ConnectParams,
) -> Result<D::Connection, RemoteError> {
    driver.connect(params).map_err(|source| RemoteError::Connect {
        server: key.server.clone(),
        db_path: params.db_path.clone(),
        source,
    })
}
