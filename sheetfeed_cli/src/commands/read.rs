use std::path::Path;

use crate::commands::Result;
use sheetfeed_core::{ConfiguredCatalog, ExcelSheetsSource, MessageWriter, SourceConfig, Source};

pub async fn run(config_path: &Path, catalog_path: &Path) -> Result<()> {
    let config = SourceConfig::from_file(config_path)?;
    let catalog = ConfiguredCatalog::from_file(catalog_path)?;
    tracing::debug!(
        streams = catalog.streams.len(),
        workbook = %config.workbook_path,
        "starting read"
    );
    let source = ExcelSheetsSource::new();

    let mut writer = MessageWriter::new(std::io::stdout());
    source.read(&config, &catalog, &mut writer).await?;
    Ok(())
}
