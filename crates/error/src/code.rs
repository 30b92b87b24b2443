use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following EMBER-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Connection errors
/// - **2000-2999**: Pushdown and remote statement errors
/// - **3000-3999**: Configuration errors
/// - **4000-4999**: Remote transaction control errors
/// - **5000-5999**: Internal errors
///
/// Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Connection Errors (1000-1999) ===
    /// EMBER-1001: Could not open a session to the remote database
    UnableToConnect = 1001,
    /// EMBER-1003: Server definition not found
    UnknownServer = 1003,
    /// EMBER-1004: No user mapping for the (server, user) pair
    UnknownUserMapping = 1004,

    // === Pushdown Errors (2000-2999) ===
    /// EMBER-2001: Expression cannot be rendered for the remote dialect
    PushdownUnsupported = 2001,
    /// EMBER-2002: Data type has no remote representation
    UnsupportedDataType = 2002,
    /// EMBER-2003: Column not found on the foreign relation
    FieldNotFound = 2003,
    /// EMBER-2004: Foreign relation not found
    TableNotFound = 2004,
    /// EMBER-2005: Identifier cannot be quoted safely
    InvalidIdentifier = 2005,
    /// EMBER-2006: Remote engine rejected a statement
    RemoteStatementFailed = 2006,

    // === Configuration Errors (3000-3999) ===
    /// EMBER-3001: Invalid YAML syntax
    InvalidYaml = 3001,
    /// EMBER-3004: Options that cannot be combined
    ConflictingOptions = 3004,

    // === Transaction Errors (4000-4999) ===
    /// EMBER-4001: Remote transaction could not be started
    BeginFailed = 4001,
    /// EMBER-4002: Remote COMMIT failed
    CommitFailed = 4002,

    // === Internal Errors (5000-5999) ===
    /// EMBER-5001: Coordinator or renderer invariant broken
    InternalInvariant = 5001,
    /// EMBER-5002: Serialization/deserialization failed
    SerializationFailed = 5002,

    /// EMBER-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "EMBER-2003")
    pub fn as_str(&self) -> String {
        format!("EMBER-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Connection,
            2000..=2999 => ErrorCategory::Query,
            3000..=3999 => ErrorCategory::Config,
            4000..=4999 => ErrorCategory::Transaction,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("EMBER-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::UnableToConnect),
            1003 => Ok(Self::UnknownServer),
            1004 => Ok(Self::UnknownUserMapping),
            2001 => Ok(Self::PushdownUnsupported),
            2002 => Ok(Self::UnsupportedDataType),
            2003 => Ok(Self::FieldNotFound),
            2004 => Ok(Self::TableNotFound),
            2005 => Ok(Self::InvalidIdentifier),
            2006 => Ok(Self::RemoteStatementFailed),
            3001 => Ok(Self::InvalidYaml),
            3004 => Ok(Self::ConflictingOptions),
            4001 => Ok(Self::BeginFailed),
            4002 => Ok(Self::CommitFailed),
            5001 => Ok(Self::InternalInvariant),
            5002 => Ok(Self::SerializationFailed),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Connection,
    Query,
    Config,
    Transaction,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(ErrorCode::UnableToConnect.as_str(), "EMBER-1001");
        assert_eq!(ErrorCode::PushdownUnsupported.as_str(), "EMBER-2001");
        assert_eq!(ErrorCode::Unknown.as_str(), "EMBER-9999");
    }

    #[test]
    fn test_error_code_parsing() {
        assert_eq!(
            ErrorCode::try_from("EMBER-4002".to_string()).unwrap(),
            ErrorCode::CommitFailed
        );
        assert_eq!(
            ErrorCode::try_from("EMBER-9999".to_string()).unwrap(),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn test_error_code_parsing_errors() {
        assert!(ErrorCode::try_from("INVALID".to_string()).is_err());
        assert!(ErrorCode::try_from("EMBER-0000".to_string()).is_err());
        assert!(ErrorCode::try_from("EMBER-ABC".to_string()).is_err());
        assert!(ErrorCode::try_from("ERR-1001".to_string()).is_err());
        // Failures that are only ever logged have no code.
        assert!(ErrorCode::try_from("EMBER-4003".to_string()).is_err());
        assert!(ErrorCode::try_from("EMBER-4004".to_string()).is_err());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCode::UnknownServer.category(), ErrorCategory::Connection);
        assert_eq!(ErrorCode::FieldNotFound.category(), ErrorCategory::Query);
        assert_eq!(ErrorCode::ConflictingOptions.category(), ErrorCategory::Config);
        assert_eq!(ErrorCode::BeginFailed.category(), ErrorCategory::Transaction);
        assert_eq!(
            ErrorCode::InternalInvariant.category(),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Internal);
    }
}
