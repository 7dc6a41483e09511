//! The connector's output surface: line-delimited JSON messages on stdout.
//! Shaped after the usual source-connector protocol (SPEC / CONNECTION_STATUS
//! / CATALOG / RECORD / LOG) without depending on any external SDK contract.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SourceError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConnectorSpecification {
    #[serde(rename = "documentationUrl", skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(rename = "connectionSpecification")]
    pub connection_specification: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Succeeded,
    Failed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConnectionStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    FullRefresh,
}

/// One syncable data source: here, one visible worksheet.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Stream {
    pub name: String,
    pub json_schema: Value,
    pub supported_sync_modes: Vec<SyncMode>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Catalog {
    pub streams: Vec<Stream>,
}

/// The subset of discovered streams an operator selected for `read`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfiguredStream {
    pub stream: Stream,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<SyncMode>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| SourceError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Record {
    pub stream: String,
    pub data: Value,
    pub emitted_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "SPEC")]
    Spec { spec: ConnectorSpecification },
    #[serde(rename = "CONNECTION_STATUS")]
    ConnectionStatus {
        #[serde(rename = "connectionStatus")]
        connection_status: ConnectionStatus,
    },
    #[serde(rename = "CATALOG")]
    Catalog { catalog: Catalog },
    #[serde(rename = "RECORD")]
    Record { record: Record },
    #[serde(rename = "LOG")]
    Log { log: LogMessage },
}

impl Message {
    pub fn record(stream: String, data: Value) -> Self {
        Message::Record {
            record: Record {
                stream,
                data,
                emitted_at: chrono::Utc::now().timestamp_millis(),
            },
        }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Message::Log {
            log: LogMessage {
                level,
                message: message.into(),
            },
        }
    }
}

/// Serializes one message per line and flushes, so a consumer reading the
/// pipe sees records as they are produced.
pub struct MessageWriter<W: Write> {
    inner: W,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, message: &Message) -> Result<(), SourceError> {
        serde_json::to_writer(&mut self.inner, message)?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_serialize_with_type_tags() {
        let catalog = Message::Catalog {
            catalog: Catalog {
                streams: vec![Stream {
                    name: "Sheet1".to_string(),
                    json_schema: json!({"type": "object"}),
                    supported_sync_modes: vec![SyncMode::FullRefresh],
                }],
            },
        };
        let value = serde_json::to_value(&catalog).unwrap();
        assert_eq!(value["type"], "CATALOG");
        assert_eq!(value["catalog"]["streams"][0]["name"], "Sheet1");
        assert_eq!(
            value["catalog"]["streams"][0]["supported_sync_modes"][0],
            "full_refresh"
        );

        let status = Message::ConnectionStatus {
            connection_status: ConnectionStatus {
                status: Status::Failed,
                message: Some("boom".to_string()),
            },
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["type"], "CONNECTION_STATUS");
        assert_eq!(value["connectionStatus"]["status"], "FAILED");

        let log = Message::log(LogLevel::Warn, "careful");
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["type"], "LOG");
        assert_eq!(value["log"]["level"], "WARN");
    }

    #[test]
    fn record_messages_carry_emitted_at() {
        let message = Message::record("orders".to_string(), json!({"id": "1"}));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "RECORD");
        assert_eq!(value["record"]["stream"], "orders");
        assert!(value["record"]["emitted_at"].as_i64().unwrap() > 0);
    }

    #[test]
    fn writer_emits_one_json_object_per_line() {
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .write(&Message::log(LogLevel::Info, "first"))
            .unwrap();
        writer
            .write(&Message::log(LogLevel::Info, "second"))
            .unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["type"], "LOG");
        }
    }

    #[test]
    fn configured_catalog_round_trips() {
        let raw = json!({
            "streams": [
                { "stream": { "name": "orders", "json_schema": {"type": "object"},
                              "supported_sync_modes": ["full_refresh"] },
                  "sync_mode": "full_refresh" },
                { "stream": { "name": "refunds", "json_schema": {"type": "object"},
                              "supported_sync_modes": ["full_refresh"] } }
            ]
        });
        let catalog: ConfiguredCatalog = serde_json::from_value(raw).unwrap();
        assert_eq!(catalog.streams.len(), 2);
        assert_eq!(catalog.streams[0].sync_mode, Some(SyncMode::FullRefresh));
        assert_eq!(catalog.streams[1].sync_mode, None);
    }
}
