use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::config::DEFAULT_REMOTE_PORT;

// Custom Serde logic for SecretString
fn serialize_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(_) => serializer.serialize_str("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(SecretString::from))
}

fn default_port() -> u16 {
    DEFAULT_REMOTE_PORT
}

fn default_updatable() -> bool {
    true
}

/// A named remote server definition.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(nested)]
    pub options: ServerOptions,
}

/// Recognized options of a remote server.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ServerOptions {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub address: Option<String>,

    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    #[validate(length(min = 1))]
    pub database: String,

    /// Evaluate every predicate locally
    #[serde(default)]
    pub disable_pushdowns: bool,

    #[serde(default = "default_updatable")]
    pub updatable: bool,

    #[serde(default)]
    pub quote_identifiers: bool,

    /// Booleans are stored as 0/1 integers on the remote side
    #[serde(default)]
    pub implicit_bool_type: bool,
}

impl ServerOptions {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            address: None,
            port: DEFAULT_REMOTE_PORT,
            database: database.into(),
            disable_pushdowns: false,
            updatable: true,
            quote_identifiers: false,
            implicit_bool_type: false,
        }
    }

    /// Remote database path in `address[/port]:database` form.
    ///
    /// The port segment is left out when it is the default one.
    pub fn db_path(&self) -> String {
        match &self.address {
            Some(address) if self.port != DEFAULT_REMOTE_PORT => {
                format!("{}/{}:{}", address, self.port, self.database)
            }
            Some(address) => format!("{}:{}", address, self.database),
            None => self.database.clone(),
        }
    }
}

/// Credentials used by one local principal on one server.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct UserMappingConfig {
    #[validate(length(min = 1))]
    pub server: String,

    #[validate(length(min = 1))]
    pub user: String,

    #[serde(default)]
    #[validate(nested)]
    pub options: UserMappingOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UserMappingOptions {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: Option<SecretString>,
}

/// A local table whose rows live on a remote server.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ForeignTableConfig {
    /// Local relation name
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub server: String,

    #[serde(default)]
    #[validate(nested)]
    pub options: TableOptions,

    /// Local columns in ordinal order
    #[serde(default)]
    #[validate(nested)]
    pub columns: Vec<ColumnConfig>,
}

impl ForeignTableConfig {
    /// Remote relation text: the configured remote name or the local one,
    /// or `None` when the table is backed by a query.
    pub fn remote_name(&self) -> Option<&str> {
        if self.options.query.is_some() {
            return None;
        }
        Some(self.options.table_name.as_deref().unwrap_or(&self.name))
    }

    pub fn is_updatable(&self, server: &ServerOptions) -> bool {
        self.options.query.is_none() && self.options.updatable.unwrap_or(server.updatable)
    }

    pub fn quote_identifier(&self, server: &ServerOptions) -> bool {
        self.options
            .quote_identifier
            .unwrap_or(server.quote_identifiers)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[validate(schema(function = "validate_table_source"))]
pub struct TableOptions {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub table_name: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub query: Option<String>,

    #[serde(default)]
    pub updatable: Option<bool>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub estimated_row_count: Option<i64>,

    #[serde(default)]
    pub quote_identifier: Option<bool>,
}

fn validate_table_source(options: &TableOptions) -> Result<(), ValidationError> {
    if options.table_name.is_some() && options.query.is_some() {
        return Err(ValidationError::new("table_name_and_query"));
    }
    if options.query.is_some() && options.updatable == Some(true) {
        return Err(ValidationError::new("query_not_updatable"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ColumnConfig {
    #[validate(length(min = 1))]
    pub name: String,

    /// Local type name, e.g. `int4`, `varchar`, `bool`
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub data_type: String,

    #[serde(default)]
    pub options: ColumnOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ColumnOptions {
    #[serde(default)]
    pub column_name: Option<String>,

    #[serde(default)]
    pub quote_identifier: Option<bool>,

    #[serde(default)]
    pub implicit_bool_type: bool,
}

impl ColumnConfig {
    pub fn remote_name(&self) -> &str {
        self.options.column_name.as_deref().unwrap_or(&self.name)
    }

    /// Column setting wins over the table's, which wins over the server's.
    pub fn quote_identifier(&self, table: &ForeignTableConfig, server: &ServerOptions) -> bool {
        self.options
            .quote_identifier
            .unwrap_or_else(|| table.quote_identifier(server))
    }
}
