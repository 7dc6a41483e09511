use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SourceError;

fn default_tenant() -> String {
    "common".to_string()
}

fn default_batch_size() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}

/// Credentials for the Microsoft Graph API, discriminated by `auth_type`.
#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "auth_type")]
pub enum Credentials {
    /// OAuth application acting on behalf of a user. When a refresh token is
    /// present it is exchanged for access tokens; otherwise the app falls
    /// back to the client credentials grant.
    Client {
        #[serde(default = "default_tenant")]
        tenant_id: String,
        client_id: String,
        client_secret: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_token: Option<String>,
    },
    /// Application-only access via the client credentials grant.
    Service {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    pub fn tenant_id(&self) -> &str {
        match self {
            Credentials::Client { tenant_id, .. } | Credentials::Service { tenant_id, .. } => {
                tenant_id
            }
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Credentials::Client { client_id, .. } | Credentials::Service { client_id, .. } => {
                client_id
            }
        }
    }

    pub fn client_secret(&self) -> &str {
        match self {
            Credentials::Client { client_secret, .. }
            | Credentials::Service { client_secret, .. } => client_secret,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Credentials::Client { refresh_token, .. } => refresh_token.as_deref(),
            Credentials::Service { .. } => None,
        }
    }
}

// Secrets stay out of Debug output and therefore out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Client {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("Client")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .field("refresh_token", &"***")
                .finish(),
            Credentials::Service {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("Service")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .finish(),
        }
    }
}

/// Renames a worksheet-derived stream as it appears downstream.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StreamNameOverride {
    pub source_stream_name: String,
    pub custom_stream_name: String,
}

/// Connector configuration, usually loaded from the `--config` JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceConfig {
    /// Path to the workbook within the drive, forward slashes, leading `/`.
    /// Examples: `/Orders.xlsx`, `/Documents/Reports/Sales.xlsx`.
    pub workbook_path: String,

    pub credentials: Credentials,

    /// How many worksheet rows are requested per Graph API range call.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Convert column names to a SQL-compliant format (snake_case, ASCII).
    #[serde(default)]
    pub names_conversion: bool,

    /// Convert Excel date serial numbers to `YYYY-MM-DD` strings for
    /// date-named columns.
    #[serde(default = "default_true")]
    pub parse_dates: bool,

    #[serde(default)]
    pub stream_name_overrides: Vec<StreamNameOverride>,
}

impl SourceConfig {
    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        let mut config: SourceConfig = serde_json::from_value(value)
            .map_err(|e| SourceError::InvalidConfig(e.to_string()))?;
        if config.workbook_path.is_empty() {
            return Err(SourceError::InvalidConfig(
                "workbook_path must not be empty".to_string(),
            ));
        }
        if !config.workbook_path.starts_with('/') {
            config.workbook_path.insert(0, '/');
        }
        if config.batch_size == 0 {
            return Err(SourceError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| SourceError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_value(value)
    }

    /// JSON Schema describing this configuration, embedded in the SPEC
    /// message so orchestrators can render a config form.
    pub fn connection_spec() -> Value {
        let schema = schemars::schema_for!(SourceConfig);
        serde_json::to_value(schema).unwrap_or(Value::Null)
    }
}
