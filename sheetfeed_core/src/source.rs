use std::io::Write;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::GraphClient;
use crate::config::SourceConfig;
use crate::error::{FailureKind, SourceError};
use crate::protocol::{
    Catalog, ConfiguredCatalog, ConnectionStatus, ConnectorSpecification, LogLevel, Message,
    MessageWriter, Status,
};
use crate::streams::WorksheetStream;

pub const DOCUMENTATION_URL: &str = "https://github.com/sheetfeed/sheetfeed#readme";

/// The connector seam: the four operations every source exposes.
#[async_trait]
pub trait Source: Send + Sync {
    /// The configuration specification. No I/O.
    fn spec(&self) -> ConnectorSpecification;

    /// Validates config and connectivity. Failures become a FAILED status
    /// with an operator-readable message, never an Err.
    async fn check(&self, config: &SourceConfig) -> ConnectionStatus;

    /// Enumerates the streams available under this config.
    async fn discover(&self, config: &SourceConfig) -> Result<Catalog, SourceError>;

    /// Emits RECORD messages for each configured stream, sequentially.
    async fn read<W: Write + Send>(
        &self,
        config: &SourceConfig,
        catalog: &ConfiguredCatalog,
        writer: &mut MessageWriter<W>,
    ) -> Result<(), SourceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelSheetsSource;

impl ExcelSheetsSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Source for ExcelSheetsSource {
    fn spec(&self) -> ConnectorSpecification {
        ConnectorSpecification {
            documentation_url: Some(DOCUMENTATION_URL.to_string()),
            connection_specification: SourceConfig::connection_spec(),
        }
    }

    async fn check(&self, config: &SourceConfig) -> ConnectionStatus {
        let client = GraphClient::new(config);
        match client.check().await {
            Ok(()) => ConnectionStatus {
                status: Status::Succeeded,
                message: None,
            },
            Err(err) => {
                let prefix = match err.failure_kind() {
                    FailureKind::Config => "configuration error",
                    FailureKind::Auth => "authentication failed",
                    FailureKind::Transient => "request failed",
                    FailureKind::Internal => "internal error",
                };
                ConnectionStatus {
                    status: Status::Failed,
                    message: Some(format!("{}: {}", prefix, err)),
                }
            }
        }
    }

    async fn discover(&self, config: &SourceConfig) -> Result<Catalog, SourceError> {
        let client = GraphClient::new(config);
        let worksheets = client.list_worksheets().await?;
        if worksheets.is_empty() {
            return Err(SourceError::Workbook {
                path: config.workbook_path.clone(),
                message: "no visible worksheets found in the workbook".to_string(),
            });
        }
        let mut streams = Vec::with_capacity(worksheets.len());
        for worksheet in worksheets {
            let stream = WorksheetStream::new(worksheet, config);
            streams.push(stream.discover(&client, config).await);
        }
        Ok(Catalog { streams })
    }

    async fn read<W: Write + Send>(
        &self,
        config: &SourceConfig,
        catalog: &ConfiguredCatalog,
        writer: &mut MessageWriter<W>,
    ) -> Result<(), SourceError> {
        let client = GraphClient::new(config);
        let available: Vec<WorksheetStream> = client
            .list_worksheets()
            .await?
            .into_iter()
            .map(|worksheet| WorksheetStream::new(worksheet, config))
            .collect();

        for configured in &catalog.streams {
            let name = &configured.stream.name;
            match available.iter().find(|s| s.name() == name.as_str()) {
                Some(stream) => {
                    info!(stream = %name, "syncing stream");
                    let emitted = stream.read_records(&client, config, writer).await?;
                    info!(stream = %name, records = emitted, "finished stream");
                }
                None => {
                    warn!(stream = %name, "configured stream not found in workbook");
                    writer.write(&Message::log(
                        LogLevel::Warn,
                        format!("stream '{}' not found in workbook, skipping", name),
                    ))?;
                }
            }
        }
        Ok(())
    }
}
