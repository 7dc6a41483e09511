use std::path::Path;

use crate::commands::Result;
use sheetfeed_core::{ExcelSheetsSource, Message, MessageWriter, SourceConfig, Source};

pub async fn run(config_path: &Path) -> Result<()> {
    let config = SourceConfig::from_file(config_path)?;
    let source = ExcelSheetsSource::new();
    let status = source.check(&config).await;

    let mut writer = MessageWriter::new(std::io::stdout());
    writer.write(&Message::ConnectionStatus {
        connection_status: status,
    })?;
    Ok(())
}
