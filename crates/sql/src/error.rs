use crate::expr::{AttrNumber, DataType, RelationId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlGenError {
    #[error("Unsupported expression for remote rendering: {0}")]
    UnsupportedExpr(String),

    #[error("Operator '{name}' has no capability entry for remote version {version}")]
    MissingOperator { name: String, version: i32 },

    #[error("Function '{name}' has no capability entry for remote version {version}")]
    MissingFunction { name: String, version: i32 },

    #[error("Attempting to push down an explicit cast to {0:?}")]
    ExplicitCast(DataType),

    #[error("Unsupported data type {0:?}")]
    UnsupportedType(DataType),

    #[error("Value cannot be represented remotely: {0}")]
    UnsupportedValue(String),

    #[error("IN list has no elements; not delegable for this instance")]
    EmptyInList,

    #[error("Column {attnum} not found on relation {relation}")]
    ColumnNotFound {
        relation: RelationId,
        attnum: AttrNumber,
        available: Vec<String>,
    },

    #[error("Column reference does not belong to relation {0}")]
    ForeignColumn(RelationId),

    #[error("Boolean column '{0}' mixes implicit and native boolean forms")]
    MixedBooleanForms(String),

    #[error("Relation '{0}' is not updatable")]
    NotUpdatable(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl SqlGenError {
    pub fn to_ember_error(self, relation_name: &str) -> emberlink_error::EmberError {
        use emberlink_error::{EmberError, ErrorCode, ErrorContext};

        let pushdown = |operation: &str, reason: String| ErrorContext::Pushdown {
            operation: operation.to_string(),
            reason,
        };

        match self {
            SqlGenError::UnsupportedExpr(kind) => EmberError::new(
                ErrorCode::InternalInvariant,
                format!("Expression '{}' reached the renderer without being accepted", kind),
            )
            .with_context(pushdown("render", kind))
            .with_hint("Only expressions accepted by classify() may be rendered"),
            SqlGenError::MissingOperator { name, version } => {
                let mut data = std::collections::HashMap::new();
                data.insert("operator".to_string(), serde_json::Value::String(name.clone()));
                data.insert("remote_version".to_string(), serde_json::Value::from(version));
                EmberError::new(
                    ErrorCode::InternalInvariant,
                    format!("Unable to handle operator {}", name),
                )
                .with_context(ErrorContext::Generic { data })
            }
            SqlGenError::MissingFunction { name, version } => {
                let mut data = std::collections::HashMap::new();
                data.insert("function".to_string(), serde_json::Value::String(name.clone()));
                data.insert("remote_version".to_string(), serde_json::Value::from(version));
                EmberError::new(
                    ErrorCode::InternalInvariant,
                    format!("Unable to handle function {}", name),
                )
                .with_context(ErrorContext::Generic { data })
            }
            SqlGenError::ExplicitCast(target) => EmberError::new(
                ErrorCode::InternalInvariant,
                format!("Attempting to push down an explicit cast to {:?}", target),
            )
            .with_context(pushdown("relabel", format!("{:?}", target))),
            SqlGenError::UnsupportedType(data_type) => EmberError::new(
                ErrorCode::UnsupportedDataType,
                format!("Unsupported data type {:?}", data_type),
            )
            .with_hint("The remote engine has no representation for this type"),
            SqlGenError::UnsupportedValue(value) => EmberError::new(
                ErrorCode::UnsupportedDataType,
                format!("Value cannot be represented remotely: {}", value),
            ),
            SqlGenError::EmptyInList => EmberError::new(
                ErrorCode::PushdownUnsupported,
                "IN list has no elements",
            )
            .with_context(pushdown("in_list", "empty array".to_string()))
            .with_hint("Evaluate this condition locally"),
            // Only the ordinal is known, so there is nothing to suggest.
            SqlGenError::ColumnNotFound {
                attnum, available, ..
            } => EmberError::new(
                ErrorCode::FieldNotFound,
                format!("Column #{} not found on '{}'", attnum, relation_name),
            )
            .with_context(ErrorContext::FieldNotFound {
                field: format!("#{}", attnum),
                table: Some(relation_name.to_string()),
                available_fields: available,
            }),
            SqlGenError::ForeignColumn(relation) => EmberError::new(
                ErrorCode::InternalInvariant,
                format!("Column reference does not belong to relation {}", relation),
            )
            .with_context(pushdown("column", relation_name.to_string())),
            SqlGenError::MixedBooleanForms(column) => EmberError::new(
                ErrorCode::InternalInvariant,
                format!(
                    "Boolean column '{}' mixes implicit and native boolean forms",
                    column
                ),
            )
            .with_hint("Compare implicit boolean columns only with boolean literals"),
            SqlGenError::NotUpdatable(relation) => EmberError::new(
                ErrorCode::ConflictingOptions,
                format!("Relation '{}' is not updatable", relation),
            )
            .with_hint("Set 'updatable: true' on a table-backed foreign table"),
            SqlGenError::InvalidIdentifier(e) => EmberError::new(
                ErrorCode::InvalidIdentifier,
                format!("Invalid SQL identifier: {}", e),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberlink_error::{ErrorCategory, ErrorCode};

    #[test]
    fn test_invariant_errors_are_internal() {
        let err = SqlGenError::UnsupportedExpr("SubQuery".to_string()).to_ember_error("employee");
        assert_eq!(err.code, ErrorCode::InternalInvariant);
        assert_eq!(err.category(), ErrorCategory::Internal);

        let err = SqlGenError::ExplicitCast(DataType::Text).to_ember_error("employee");
        assert_eq!(err.code, ErrorCode::InternalInvariant);
    }

    #[test]
    fn test_empty_in_list_maps_to_pushdown() {
        let err = SqlGenError::EmptyInList.to_ember_error("employee");
        assert_eq!(err.code, ErrorCode::PushdownUnsupported);
        assert!(err.hint.is_some());
    }
}
