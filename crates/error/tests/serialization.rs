use emberlink_error::{EmberError, ErrorCode, ErrorContext};
use serde_json::Value;

#[test]
fn test_json_serialization() {
    let error = EmberError::new(ErrorCode::FieldNotFound, "Field 'revenu' not found")
        .with_context(ErrorContext::FieldNotFound {
            field: "revenu".to_string(),
            table: Some("sales".to_string()),
            available_fields: vec!["revenue".to_string(), "cost".to_string()],
        })
        .with_hint("Did you mean 'revenue'?");

    let v: Value = serde_json::from_str(&error.to_json()).expect("valid json");

    assert_eq!(v["code"], "EMBER-2003");
    assert_eq!(v["message"], "Field 'revenu' not found");
    assert_eq!(v["hint"], "Did you mean 'revenue'?");
    assert_eq!(v["context"]["type"], "field_not_found");
    assert_eq!(v["context"]["field"], "revenu");
}

#[test]
fn test_remote_detail_serialization() {
    let error = EmberError::new(ErrorCode::RemoteStatementFailed, "remote statement failed")
        .with_detail("Dynamic SQL Error")
        .with_context(ErrorContext::RemoteStatement {
            sql: "SAVEPOINT s2".to_string(),
        });

    let v: Value = serde_json::from_str(&error.to_json()).expect("valid json");
    assert_eq!(v["detail"], "Dynamic SQL Error");
    assert_eq!(v["context"]["type"], "remote_statement");
    assert_eq!(v["context"]["sql"], "SAVEPOINT s2");

    let back: EmberError = serde_json::from_value(v).expect("deserializes");
    assert_eq!(back.code, ErrorCode::RemoteStatementFailed);
}

#[test]
fn test_error_code_parsing() {
    let code: ErrorCode = "EMBER-1004".to_string().try_into().unwrap();
    assert_eq!(code, ErrorCode::UnknownUserMapping);
}
