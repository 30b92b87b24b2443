//! Predicate pushdown compiler for emberlink remote tables.
//!
//! This crate decides which parts of a local predicate the remote engine can
//! evaluate and writes them out in the remote dialect:
//! - **Capability Table**: operators and functions the remote version accepts (`capability`).
//! - **Classifier**: the delegable / local split (`classify`).
//! - **Renderer**: remote SQL text for accepted trees (`render`).
//! - **Assembler**: complete SELECT / INSERT / UPDATE / DELETE statements (`assemble`).
pub mod assemble;
pub mod capability;
pub mod classify;
pub mod error;
pub mod expr;
pub mod quote;
pub mod relation;
pub mod render;

pub use assemble::{
    build_delete, build_insert, build_select, build_update, render_where, ColumnSelection,
    RemoteStatement, RetrievedAttr, ROW_IDENTITY_COLUMN,
};
pub use capability::{CapabilityTable, BOOLEAN_MIN_VERSION};
pub use classify::{classify, is_delegable, Partition};
pub use error::SqlGenError;
pub use expr::{DataType, Datum, Expr};
pub use relation::{ColumnDescriptor, PushdownContext, RelationDescriptor, RelationSource};
pub use render::render;
