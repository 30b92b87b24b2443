use emberlink_error::{EmberError, ErrorCode, ErrorContext};
use thiserror::Error;

use crate::driver::DriverError;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("could not connect to server \"{server}\"")]
    Connect {
        server: String,
        db_path: String,
        #[source]
        source: DriverError,
    },

    #[error("unable to start remote transaction")]
    Begin {
        #[source]
        source: DriverError,
    },

    #[error("COMMIT failed")]
    Commit {
        #[source]
        source: DriverError,
    },

    #[error("missed cleaning up connection during pre-commit")]
    MissedCleanup { xact_depth: u32 },

    #[error("missed cleaning up remote subtransaction at level {level}")]
    MissedSubxactCleanup { xact_depth: u32, level: u32 },

    #[error("remote statement failed")]
    Statement {
        sql: String,
        #[source]
        source: DriverError,
    },

    #[error("remote result has {actual} columns, expected {expected}")]
    ResultShape { expected: usize, actual: usize },

    #[error("row identifier is not a binary value")]
    RowIdentity,
}

impl RemoteError {
    pub fn statement(sql: impl Into<String>, source: DriverError) -> Self {
        Self::Statement {
            sql: sql.into(),
            source,
        }
    }
}

impl From<RemoteError> for EmberError {
    fn from(err: RemoteError) -> Self {
        let message = err.to_string();
        match err {
            RemoteError::Connect {
                server,
                db_path,
                source,
            } => EmberError::new(ErrorCode::UnableToConnect, message)
                .with_detail(source.to_string())
                .with_context(ErrorContext::Connection { server, db_path }),
            RemoteError::Begin { source } => {
                EmberError::new(ErrorCode::BeginFailed, message).with_detail(source.to_string())
            }
            RemoteError::Commit { source } => {
                EmberError::new(ErrorCode::CommitFailed, message).with_detail(source.to_string())
            }
            RemoteError::MissedCleanup { xact_depth } => {
                EmberError::new(ErrorCode::InternalInvariant, message)
                    .with_context(ErrorContext::Transaction {
                        xact_depth,
                        level: 0,
                    })
            }
            RemoteError::MissedSubxactCleanup { xact_depth, level } => {
                EmberError::new(ErrorCode::InternalInvariant, message)
                    .with_context(ErrorContext::Transaction { xact_depth, level })
            }
            RemoteError::Statement { sql, source } => {
                EmberError::new(ErrorCode::RemoteStatementFailed, message)
                    .with_detail(source.to_string())
                    .with_context(ErrorContext::RemoteStatement { sql })
            }
            RemoteError::ResultShape { .. } | RemoteError::RowIdentity => {
                EmberError::new(ErrorCode::InternalInvariant, message)
            }
        }
    }
}
