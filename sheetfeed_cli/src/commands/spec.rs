use crate::commands::Result;
use sheetfeed_core::{ExcelSheetsSource, Message, MessageWriter, Source};

pub fn run() -> Result<()> {
    let source = ExcelSheetsSource::new();
    let mut writer = MessageWriter::new(std::io::stdout());
    writer.write(&Message::Spec { spec: source.spec() })?;
    Ok(())
}
