//! Remote-side description of the foreign relation being planned.
//!
//! A `RelationDescriptor` maps local column ordinals to remote column names
//! and carries the quoting and implicit boolean decisions for each column.
//! `PushdownContext` pairs it with the live remote version.

use emberlink_common::{ForeignTableConfig, ServerOptions};

use crate::capability::{CapabilityTable, BOOLEAN_MIN_VERSION};
use crate::error::SqlGenError;
use crate::expr::{AttrNumber, ColumnRef, DataType, RelationId};
use crate::quote::{quote_identifier, validate_identifier};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub attnum: AttrNumber,
    pub local_name: String,
    pub remote_name: Option<String>,
    pub data_type: DataType,
    /// Column-level override of the relation's quoting flag
    pub quote_identifier: Option<bool>,
    pub implicit_bool_type: bool,
    pub dropped: bool,
}

impl ColumnDescriptor {
    pub fn new(attnum: AttrNumber, local_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            attnum,
            local_name: local_name.into(),
            remote_name: None,
            data_type,
            quote_identifier: None,
            implicit_bool_type: false,
            dropped: false,
        }
    }

    pub fn with_remote_name(mut self, name: impl Into<String>) -> Self {
        self.remote_name = Some(name.into());
        self
    }

    pub fn with_quote_identifier(mut self, quote: bool) -> Self {
        self.quote_identifier = Some(quote);
        self
    }

    pub fn with_implicit_bool(mut self) -> Self {
        self.implicit_bool_type = true;
        self
    }

    pub fn dropped(mut self) -> Self {
        self.dropped = true;
        self
    }

    pub fn remote_name(&self) -> &str {
        self.remote_name.as_deref().unwrap_or(&self.local_name)
    }
}

/// What the remote side of a foreign relation is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationSource {
    Table(String),
    /// Arbitrary remote query used as a derived table
    Query(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    pub id: RelationId,
    pub local_name: String,
    pub source: RelationSource,
    pub quote_identifier: bool,
    pub updatable: bool,
    columns: Vec<ColumnDescriptor>,
}

impl RelationDescriptor {
    pub fn new(id: RelationId, local_name: impl Into<String>) -> Self {
        let local_name = local_name.into();
        Self {
            id,
            source: RelationSource::Table(local_name.clone()),
            local_name,
            quote_identifier: false,
            updatable: true,
            columns: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: RelationSource) -> Self {
        if matches!(source, RelationSource::Query(_)) {
            self.updatable = false;
        }
        self.source = source;
        self
    }

    pub fn with_quote_identifier(mut self, quote: bool) -> Self {
        self.quote_identifier = quote;
        self
    }

    pub fn with_updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    /// Append a column. Ordinals are expected in ascending order.
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Build from configuration; columns take their ordinal from their position.
    pub fn from_config(
        id: RelationId,
        server: &ServerOptions,
        table: &ForeignTableConfig,
    ) -> Result<Self, SqlGenError> {
        let source = match (&table.options.query, table.remote_name()) {
            (Some(query), _) => RelationSource::Query(query.clone()),
            (None, Some(name)) => {
                validate_identifier(name)?;
                RelationSource::Table(name.to_string())
            }
            (None, None) => RelationSource::Table(table.name.clone()),
        };

        let mut relation = RelationDescriptor::new(id, table.name.clone())
            .with_source(source)
            .with_quote_identifier(table.quote_identifier(server))
            .with_updatable(table.is_updatable(server));

        for (idx, column) in table.columns.iter().enumerate() {
            let attnum = AttrNumber::try_from(idx + 1).map_err(|_| {
                SqlGenError::InvalidIdentifier(format!("too many columns on {}", table.name))
            })?;
            validate_identifier(column.remote_name())?;

            let mut desc =
                ColumnDescriptor::new(attnum, column.name.clone(), DataType::from_name(&column.data_type));
            desc.remote_name = column.options.column_name.clone();
            desc.quote_identifier = Some(column.quote_identifier(table, server));
            desc.implicit_bool_type = column.options.implicit_bool_type;
            relation.columns.push(desc);
        }

        Ok(relation)
    }

    /// All columns, dropped ones included, in ordinal order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Live (not dropped) column by ordinal.
    pub fn column(&self, attnum: AttrNumber) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.attnum == attnum && !c.dropped)
    }

    /// Resolve a column reference that must belong to this relation.
    pub fn resolve(&self, column: &ColumnRef) -> Result<&ColumnDescriptor, SqlGenError> {
        if column.relation != self.id || column.levels_up != 0 {
            return Err(SqlGenError::ForeignColumn(self.id));
        }
        self.column(column.attnum)
            .ok_or_else(|| SqlGenError::ColumnNotFound {
                relation: self.id,
                attnum: column.attnum,
                available: self
                    .columns
                    .iter()
                    .filter(|c| !c.dropped)
                    .map(|c| c.local_name.clone())
                    .collect(),
            })
    }

    /// Remote identifier text for a column, quoted per column > relation precedence.
    pub fn column_sql(&self, column: &ColumnDescriptor) -> String {
        quote_identifier(
            column.remote_name(),
            column.quote_identifier.unwrap_or(self.quote_identifier),
        )
    }

    /// Remote relation text for FROM / INTO / UPDATE clauses.
    pub fn relation_sql(&self) -> String {
        match &self.source {
            RelationSource::Table(name) => quote_identifier(name, self.quote_identifier),
            RelationSource::Query(query) => format!("( {} )", query),
        }
    }
}

/// Everything the classifier and renderer need about the current scan.
#[derive(Debug, Clone, Copy)]
pub struct PushdownContext<'a> {
    pub relation: &'a RelationDescriptor,
    pub remote_version: i32,
    /// Server-level implicit boolean mode
    pub implicit_bool_type: bool,
    pub disable_pushdowns: bool,
    pub capabilities: &'a CapabilityTable,
}

impl<'a> PushdownContext<'a> {
    pub fn new(relation: &'a RelationDescriptor, remote_version: i32) -> Self {
        Self {
            relation,
            remote_version,
            implicit_bool_type: false,
            disable_pushdowns: false,
            capabilities: CapabilityTable::standard(),
        }
    }

    pub fn for_server(
        relation: &'a RelationDescriptor,
        server: &ServerOptions,
        remote_version: i32,
    ) -> Self {
        Self {
            implicit_bool_type: server.implicit_bool_type,
            disable_pushdowns: server.disable_pushdowns,
            ..Self::new(relation, remote_version)
        }
    }

    pub fn with_implicit_bool(mut self, enabled: bool) -> Self {
        self.implicit_bool_type = enabled;
        self
    }

    pub fn with_pushdowns_disabled(mut self, disabled: bool) -> Self {
        self.disable_pushdowns = disabled;
        self
    }

    pub fn supports_native_bool(&self) -> bool {
        self.remote_version >= BOOLEAN_MIN_VERSION
    }

    /// Boolean column stored as an integer for predicate purposes.
    ///
    /// Remote versions without a boolean type treat every boolean column
    /// this way once the server option is on; newer versions need the
    /// column option as well.
    pub fn is_implicit_bool(&self, column: &ColumnDescriptor) -> bool {
        self.implicit_bool_type
            && column.data_type == DataType::Bool
            && (!self.supports_native_bool() || column.implicit_bool_type)
    }

    /// Implicit boolean handling for target lists, which always needs the column option.
    pub fn is_implicit_bool_target(&self, column: &ColumnDescriptor) -> bool {
        self.implicit_bool_type && column.data_type == DataType::Bool && column.implicit_bool_type
    }
}
