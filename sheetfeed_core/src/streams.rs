use std::collections::BTreeMap;
use std::io::Write;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::{GraphClient, Worksheet};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::headers::{self, column_label};
use crate::protocol::{Message, MessageWriter, Stream, SyncMode};

/// One visible worksheet exposed as one data stream.
pub struct WorksheetStream {
    worksheet: Worksheet,
    name: String,
}

impl WorksheetStream {
    pub fn new(worksheet: Worksheet, config: &SourceConfig) -> Self {
        let name = resolve_stream_name(&worksheet.name, config);
        Self { worksheet, name }
    }

    /// Stream name after overrides; falls back to the worksheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn worksheet(&self) -> &Worksheet {
        &self.worksheet
    }

    /// Catalog entry for this worksheet. The schema derives from the header
    /// row; a sheet that cannot be read degrades to the permissive fallback
    /// so discovery never fails on a single bad worksheet.
    pub async fn discover(&self, client: &GraphClient, config: &SourceConfig) -> Stream {
        let schema = match client.used_range(&self.worksheet.id).await {
            Ok(range) if !range.values.is_empty() => {
                let (_, mapping) = headers::process_headers(&range.values[0], config.names_conversion);
                header_schema(&mapping)
            }
            Ok(_) => fallback_schema(),
            Err(err) => {
                tracing::warn!(stream = %self.name, error = %err, "schema discovery failed, using fallback");
                fallback_schema()
            }
        };
        Stream {
            name: self.name.clone(),
            json_schema: schema,
            supported_sync_modes: vec![SyncMode::FullRefresh],
        }
    }

    /// Emits RECORD messages for every data row, reading the sheet in
    /// `batch_size` row chunks. Returns the number of records emitted.
    pub async fn read_records<W: Write + Send>(
        &self,
        client: &GraphClient,
        config: &SourceConfig,
        writer: &mut MessageWriter<W>,
    ) -> Result<u64, SourceError> {
        let initial = client.used_range(&self.worksheet.id).await?;
        if initial.values.len() < 2 {
            // Empty worksheet, or headers with no data rows.
            return Ok(0);
        }

        let (_, mapping) = headers::process_headers(&initial.values[0], config.names_conversion);
        if mapping.is_empty() {
            return Ok(0);
        }

        let total_rows = initial.row_count;
        // End column derived from the used range so sheets wider than Z are
        // not truncated.
        let end_column = column_label(initial.column_count.max(1) as usize - 1);

        let mut emitted = 0u64;
        let mut current_row = 2u64;
        while current_row <= total_rows {
            let end_row = (current_row + config.batch_size - 1).min(total_rows);
            let address = format!("A{}:{}{}", current_row, end_column, end_row);
            debug!(stream = %self.name, range = %address, "fetching batch");

            let batch = client.range(&self.worksheet.id, &address).await?;
            for row in &batch.values {
                if let Some(data) = build_record(row, &mapping, config.parse_dates) {
                    writer.write(&Message::record(self.name.clone(), data))?;
                    emitted += 1;
                }
            }

            current_row = end_row + 1;
        }
        Ok(emitted)
    }
}

fn resolve_stream_name(worksheet_name: &str, config: &SourceConfig) -> String {
    config
        .stream_name_overrides
        .iter()
        .find(|o| o.source_stream_name == worksheet_name)
        .map(|o| o.custom_stream_name.clone())
        .unwrap_or_else(|| worksheet_name.to_string())
}

/// Header-derived schema: every named column is a nullable string, and
/// unknown columns are tolerated rather than rejected.
pub fn header_schema(mapping: &BTreeMap<usize, String>) -> Value {
    let mut properties = Map::new();
    for header in mapping.values() {
        properties.insert(header.clone(), json!({"type": ["null", "string"]}));
    }
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": properties,
        "additionalProperties": true
    })
}

pub fn fallback_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": true
    })
}

/// One worksheet row into a record object, or `None` for rows that carry no
/// data at all (blank rows are common padding in hand-edited sheets).
pub fn build_record(
    row: &[Value],
    mapping: &BTreeMap<usize, String>,
    parse_dates: bool,
) -> Option<Value> {
    if headers::is_blank_row(row) {
        return None;
    }
    let mut data = Map::new();
    for (idx, header) in mapping {
        if let Some(cell) = row.get(*idx) {
            if let Some(parsed) = headers::parse_cell_value(cell, header, parse_dates) {
                data.insert(header.clone(), Value::String(parsed));
            }
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(Value::Object(data))
    }
}
