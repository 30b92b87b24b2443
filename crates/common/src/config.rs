use anyhow::{Context, Result};
use emberlink_error::{find_closest_match, EmberError, ErrorCode, ErrorContext};
use serde::Deserialize;
use validator::Validate;

use crate::models::{ForeignTableConfig, ServerConfig, UserMappingConfig};

// Default constants
pub const DEFAULT_REMOTE_PORT: u16 = 3050;
pub const DEFAULT_LOCAL_ENCODING: &str = "UTF8";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const ENV_PREFIX: &str = "EMBERLINK";

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    /// Encoding of the local database; selects the remote client encoding
    #[serde(default = "default_local_encoding")]
    #[validate(length(min = 1))]
    pub local_encoding: String,

    #[serde(default)]
    #[validate(nested)]
    pub log: LogConfig,

    #[serde(default)]
    #[validate(nested)]
    pub servers: Vec<ServerConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub user_mappings: Vec<UserMappingConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub foreign_tables: Vec<ForeignTableConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_encoding: default_local_encoding(),
            log: LogConfig::default(),
            servers: Vec::new(),
            user_mappings: Vec::new(),
            foreign_tables: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_local_encoding() -> String {
    DEFAULT_LOCAL_ENCODING.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder();

        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        // EMBERLINK__LOG__LEVEL maps to log.level
        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build().context("Failed to build configuration")?;

        let app_config: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {:?}", e))?;

        Ok(app_config)
    }

    pub fn server(&self, name: &str) -> emberlink_error::Result<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name).ok_or_else(|| {
            let known: Vec<String> = self.servers.iter().map(|s| s.name.clone()).collect();
            with_suggestion(
                EmberError::new(
                    ErrorCode::UnknownServer,
                    format!("server \"{}\" does not exist", name),
                )
                .with_context(ErrorContext::Config {
                    file_path: None,
                    field: "servers".to_string(),
                }),
                name,
                &known,
            )
        })
    }

    pub fn foreign_table(&self, name: &str) -> emberlink_error::Result<&ForeignTableConfig> {
        self.foreign_tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| {
                let known: Vec<String> =
                    self.foreign_tables.iter().map(|t| t.name.clone()).collect();
                with_suggestion(
                    EmberError::new(
                        ErrorCode::TableNotFound,
                        format!("foreign table \"{}\" does not exist", name),
                    )
                    .with_context(ErrorContext::TableNotFound {
                        table: name.to_string(),
                        server: None,
                    }),
                    name,
                    &known,
                )
            })
    }

    pub fn user_mapping(
        &self,
        server: &str,
        user: &str,
    ) -> emberlink_error::Result<&UserMappingConfig> {
        self.user_mappings
            .iter()
            .find(|m| m.server == server && m.user == user)
            .ok_or_else(|| {
                EmberError::new(
                    ErrorCode::UnknownUserMapping,
                    format!(
                        "user mapping not found for \"{}\" on server \"{}\"",
                        user, server
                    ),
                )
            })
    }
}

fn with_suggestion(err: EmberError, name: &str, known: &[String]) -> EmberError {
    match find_closest_match(name, known) {
        Some(closest) => err.with_hint(format!("Did you mean '{}'?", closest)),
        None => err,
    }
}
