//! # emberlink-error
//!
//! Unified error type for the emberlink remote-table bridge.
//!
//! Every error carries:
//! - a stable numeric code (`EMBER-XXXX`)
//! - an optional `detail` holding the remote engine's own diagnostic text
//! - structured JSON context and an actionable hint

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;
pub use convert::find_closest_match;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type for all emberlink operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmberError {
    /// Numeric error code (e.g., "EMBER-1001")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Diagnostic text reported by the remote engine, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Suggestion for the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl EmberError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            context: None,
            hint: None,
        }
    }

    /// Attach the remote engine's diagnostic text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Serialize to JSON for API responses
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize EmberError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }

    /// Serialize to pretty JSON for logging
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for EmberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for EmberError {}

/// Result type alias for emberlink operations
pub type Result<T> = std::result::Result<T, EmberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ember_error_builder() {
        let err = EmberError::new(ErrorCode::UnableToConnect, "Unable to connect")
            .with_detail("connection refused")
            .with_hint("Check the server address");

        assert_eq!(err.code, ErrorCode::UnableToConnect);
        assert_eq!(err.message, "Unable to connect");
        assert_eq!(err.detail.as_deref(), Some("connection refused"));
        assert_eq!(err.hint.as_deref(), Some("Check the server address"));
        assert!(err.context.is_none());
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_display_implementation() {
        let err = EmberError::new(ErrorCode::CommitFailed, "COMMIT failed")
            .with_detail("deadlock")
            .with_hint("Retry the transaction");

        assert_eq!(
            err.to_string(),
            "[EMBER-4002] COMMIT failed: deadlock (Hint: Retry the transaction)"
        );

        let bare = EmberError::new(ErrorCode::InternalInvariant, "Crash");
        assert_eq!(bare.to_string(), "[EMBER-5001] Crash");
    }

    #[test]
    fn test_json_output() {
        let err = EmberError::new(ErrorCode::PushdownUnsupported, "cannot push down");
        let json = err.to_json();

        assert!(json.contains("\"code\":\"EMBER-2001\""));
        assert!(json.contains("\"message\":\"cannot push down\""));
        assert!(!json.contains("detail"));
    }
}
