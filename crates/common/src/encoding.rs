//! Mapping from local database encodings to remote client encodings.
//!
//! Most names match directly or are accepted as aliases by the remote side.
//! Encodings the remote side lacks are passed through unchanged and rejected
//! at connect time.

/// Client encoding to request for a local database `encoding`.
pub fn client_encoding(encoding: &str) -> String {
    let mapped = match encoding.to_ascii_uppercase().as_str() {
        "SQL_ASCII" => "NONE",
        "ISO_8859_5" => "ISO8859_5",
        "ISO_8859_6" => "ISO8859_6",
        "ISO_8859_7" => "ISO8859_7",
        "ISO_8859_8" => "ISO8859_8",
        "WIN866" => "DOS866",
        // Closest match; JIS X 0212 coverage differs
        "EUC_JP" => "EUJC_0208",
        _ => return encoding.to_string(),
    };
    tracing::debug!(target: "connection_cache", encoding, mapped, "client encoding");
    mapped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renamed_encodings() {
        assert_eq!(client_encoding("SQL_ASCII"), "NONE");
        assert_eq!(client_encoding("ISO_8859_7"), "ISO8859_7");
        assert_eq!(client_encoding("WIN866"), "DOS866");
        assert_eq!(client_encoding("EUC_JP"), "EUJC_0208");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(client_encoding("UTF8"), "UTF8");
        assert_eq!(client_encoding("WIN1252"), "WIN1252");
    }
}
