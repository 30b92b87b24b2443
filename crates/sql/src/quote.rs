//! Identifier and literal quoting for the remote dialect.
//!
//! Unquoted identifiers fold to upper case on the remote side, so a local
//! lower-case name is left bare and anything else is double-quoted.

use crate::error::SqlGenError;
use sqlparser::keywords::{
    Keyword, ALL_KEYWORDS, ALL_KEYWORDS_INDEX, RESERVED_FOR_COLUMN_ALIAS,
    RESERVED_FOR_TABLE_ALIAS,
};

/// Longest identifier the remote engine accepts.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

pub fn validate_identifier(name: &str) -> Result<(), SqlGenError> {
    if name.is_empty() {
        return Err(SqlGenError::InvalidIdentifier("empty".to_string()));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SqlGenError::InvalidIdentifier(format!(
            "too long: {}",
            name.len()
        )));
    }
    if name.contains('\x00') {
        return Err(SqlGenError::InvalidIdentifier(format!(
            "forbidden characters in: {}",
            name.escape_default()
        )));
    }
    Ok(())
}

/// Render `ident` for the remote engine, quoting it when `force` is set or
/// when it would not survive unquoted.
pub fn quote_identifier(ident: &str, force: bool) -> String {
    if !force && is_safe_bare(ident) {
        return ident.to_string();
    }

    let mut quoted = String::with_capacity(ident.len() + 2);
    quoted.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Single-quoted string literal with every embedded `'` doubled.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

fn is_safe_bare(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return false;
    }
    !is_reserved_keyword(ident)
}

fn is_reserved_keyword(ident: &str) -> bool {
    let upper = ident.to_ascii_uppercase();
    let keyword = match ALL_KEYWORDS.binary_search(&upper.as_str()) {
        Ok(idx) => ALL_KEYWORDS_INDEX[idx],
        Err(_) => return false,
    };
    keyword != Keyword::NoKeyword
        && (RESERVED_FOR_COLUMN_ALIAS.contains(&keyword)
            || RESERVED_FOR_TABLE_ALIAS.contains(&keyword))
}
