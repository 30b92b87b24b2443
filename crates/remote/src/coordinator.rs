//! Remote transaction coordination.
//!
//! Remote transactions mirror the local ones: a remote transaction is
//! started on first use inside a local transaction and local subtransaction
//! level `n` maps to remote savepoint `s{n}`. The local transaction manager
//! drives the rest through [`XactEvent`] and [`SubXactEvent`].

use std::fmt;

use tracing::{debug, warn};

use crate::cache::{ConnectionCache, ConnectionKey};
use crate::driver::{RemoteConnection, RemoteDriver};
use crate::error::RemoteError;

/// Top-level transaction lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XactEvent {
    PreCommit,
    PrePrepare,
    Commit,
    Prepare,
    Abort,
}

/// Subtransaction lifecycle events. Other local phases need no remote work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubXactEvent {
    PreCommit,
    Abort,
}

impl fmt::Display for XactEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XactEvent::PreCommit => write!(f, "pre-commit"),
            XactEvent::PrePrepare => write!(f, "pre-prepare"),
            XactEvent::Commit => write!(f, "commit"),
            XactEvent::Prepare => write!(f, "prepare"),
            XactEvent::Abort => write!(f, "abort"),
        }
    }
}

impl fmt::Display for SubXactEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubXactEvent::PreCommit => write!(f, "pre-commit"),
            SubXactEvent::Abort => write!(f, "abort"),
        }
    }
}

pub(crate) fn savepoint_name(level: u32) -> String {
    format!("s{}", level)
}

/// Bring the remote transaction on `conn` up to `nest_level`.
///
/// Savepoint statements are not checked here; a savepoint that failed to
/// open surfaces when its subtransaction ends.
pub(crate) fn ensure_open<C: RemoteConnection>(
    conn: &mut C,
    xact_depth: &mut u32,
    nest_level: u32,
    key: &ConnectionKey,
) -> Result<(), RemoteError> {
    if *xact_depth == 0 {
        debug!(target: "remote_xact", %key, "Starting remote transaction");
        conn.begin().map_err(|source| RemoteError::Begin { source })?;
        *xact_depth = 1;
    }

    while *xact_depth < nest_level {
        let sql = format!("SAVEPOINT {}", savepoint_name(*xact_depth + 1));
        debug!(target: "remote_xact", %key, %sql, "Opening remote savepoint");
        if let Err(e) = conn.execute(&sql) {
            warn!(target: "remote_xact", %key, %sql, error = %e, "Unable to open remote savepoint");
        }
        *xact_depth += 1;
    }

    if *xact_depth > nest_level {
        debug!(
            target: "remote_xact",
            %key,
            xact_depth = *xact_depth,
            nest_level,
            "Remote transaction deeper than requested level"
        );
    }
    Ok(())
}

impl<D: RemoteDriver> ConnectionCache<D> {
    /// Finish the remote side of a top-level transaction.
    ///
    /// Connections without an open remote transaction are skipped. A failed
    /// remote commit is returned immediately and leaves the remaining
    /// entries to the `Abort` event that follows.
    pub fn on_xact_event(&mut self, event: XactEvent) -> Result<(), RemoteError> {
        if !self.xact_got_connection {
            return Ok(());
        }

        for (key, entry) in self.entries.iter_mut() {
            let Some(conn) = entry.conn.as_mut() else {
                continue;
            };
            if entry.xact_depth == 0 {
                continue;
            }

            match event {
                XactEvent::PreCommit => {
                    debug!(target: "remote_xact", %key, "Committing remote transaction");
                    conn.commit().map_err(|source| RemoteError::Commit { source })?;
                }
                XactEvent::PrePrepare => {
                    debug!(target: "remote_xact", %key, "Prepare requested for remote transaction");
                }
                XactEvent::Commit | XactEvent::Prepare => {
                    return Err(RemoteError::MissedCleanup {
                        xact_depth: entry.xact_depth,
                    });
                }
                XactEvent::Abort => {
                    debug!(target: "remote_xact", %key, "Rolling back remote transaction");
                    if let Err(e) = conn.rollback() {
                        warn!(
                            target: "remote_xact",
                            %key,
                            error = %e,
                            "Unable to roll back remote transaction"
                        );
                    }
                }
            }

            entry.xact_depth = 0;
            entry.had_error = false;
        }

        debug!(target: "remote_xact", %event, "Remote transactions finished");
        self.xact_got_connection = false;
        Ok(())
    }

    /// Release or roll back the savepoint for subtransaction `level`.
    pub fn on_subxact_event(&mut self, event: SubXactEvent, level: u32) -> Result<(), RemoteError> {
        if !self.xact_got_connection {
            return Ok(());
        }

        let savepoint = savepoint_name(level);
        for (key, entry) in self.entries.iter_mut() {
            let Some(conn) = entry.conn.as_mut() else {
                continue;
            };
            if entry.xact_depth < level {
                continue;
            }
            if entry.xact_depth > level {
                return Err(RemoteError::MissedSubxactCleanup {
                    xact_depth: entry.xact_depth,
                    level,
                });
            }

            match event {
                SubXactEvent::PreCommit => {
                    run_savepoint_command(conn, key, &format!("RELEASE SAVEPOINT {}", savepoint));
                }
                SubXactEvent::Abort => {
                    entry.had_error = true;
                    if run_savepoint_command(
                        conn,
                        key,
                        &format!("ROLLBACK TO SAVEPOINT {}", savepoint),
                    ) {
                        run_savepoint_command(conn, key, &format!("RELEASE SAVEPOINT {}", savepoint));
                    }
                }
            }

            entry.xact_depth -= 1;
        }
        Ok(())
    }
}

fn run_savepoint_command<C: RemoteConnection>(conn: &mut C, key: &ConnectionKey, sql: &str) -> bool {
    debug!(target: "remote_xact", %key, %sql, "Remote savepoint command");
    match conn.execute(sql) {
        Ok(_) => true,
        Err(e) => {
            warn!(target: "remote_xact", %key, %sql, error = %e, "Unable to execute remote savepoint command");
            false
        }
    }
}
