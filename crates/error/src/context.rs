use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structured context attached to an [`EmberError`](crate::EmberError).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorContext {
    FieldNotFound {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        available_fields: Vec<String>,
    },
    TableNotFound {
        table: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        server: Option<String>,
    },
    Connection {
        server: String,
        db_path: String,
    },
    RemoteStatement {
        sql: String,
    },
    Transaction {
        xact_depth: u32,
        level: u32,
    },
    Pushdown {
        operation: String,
        reason: String,
    },
    Config {
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        field: String,
    },
    Generic {
        #[serde(flatten)]
        data: HashMap<String, serde_json::Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_serialization_roundtrip() {
        let ctx = ErrorContext::Transaction {
            xact_depth: 3,
            level: 2,
        };

        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"type\":\"transaction\""));

        let back: ErrorContext = serde_json::from_str(&json).unwrap();
        match back {
            ErrorContext::Transaction { xact_depth, level } => {
                assert_eq!(xact_depth, 3);
                assert_eq!(level, 2);
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    #[test]
    fn test_generic_context_flattens() {
        let mut data = HashMap::new();
        data.insert("function".to_string(), serde_json::json!("lpad"));
        let ctx = ErrorContext::Generic { data };

        let v = serde_json::to_value(&ctx).unwrap();
        assert_eq!(v["type"], "generic");
        assert_eq!(v["function"], "lpad");
    }
}
