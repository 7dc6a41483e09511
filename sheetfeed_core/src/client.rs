use serde::Deserialize;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::oauth::TokenProvider;

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// A worksheet entry as returned by the Graph worksheets collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Worksheet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub visibility: Option<String>,
}

impl Worksheet {
    pub fn is_visible(&self) -> bool {
        matches!(self.visibility.as_deref(), Some("Visible"))
    }
}

/// A cell range as returned by `usedRange` or `range(address=...)`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeData {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub column_count: u64,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct WorksheetList {
    #[serde(default)]
    value: Vec<Worksheet>,
}

/// Thin client over the Graph workbook endpoints. One instance per sync;
/// requests run sequentially over a shared connection pool.
pub struct GraphClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    workbook_path: String,
}

impl GraphClient {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens: TokenProvider::new(config.credentials.clone()),
            workbook_path: config.workbook_path.clone(),
        }
    }

    pub fn workbook_path(&self) -> &str {
        &self.workbook_path
    }

    fn workbook_url(&self, suffix: &str) -> String {
        let encoded = encode_drive_path(&self.workbook_path);
        format!("{}/me/drive/root:/{}:/workbook/{}", GRAPH_BASE, encoded, suffix)
    }

    async fn get_json(
        &self,
        url: String,
    ) -> Result<(reqwest::StatusCode, Value), SourceError> {
        let token = self.tokens.access_token(&self.http).await?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(SourceError::HttpRequest)?;
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    fn graph_error(status: reqwest::StatusCode, body: &Value) -> SourceError {
        SourceError::Graph {
            status: status.as_u16(),
            message: graph_error_message(body),
        }
    }

    /// Visible worksheets of the workbook, in workbook order. Hidden sheets
    /// never surface.
    pub async fn list_worksheets(&self) -> Result<Vec<Worksheet>, SourceError> {
        let url = self.workbook_url("worksheets");
        let (status, body) = self.get_json(url).await?;
        if !status.is_success() {
            return Err(SourceError::Workbook {
                path: self.workbook_path.clone(),
                message: format!("{} ({})", graph_error_message(&body), status.as_u16()),
            });
        }
        let list: WorksheetList = serde_json::from_value(body)?;
        Ok(list.value.into_iter().filter(|ws| ws.is_visible()).collect())
    }

    /// The worksheet's used range. A 404 means the worksheet has no cells
    /// and comes back as an empty range.
    pub async fn used_range(&self, worksheet_id: &str) -> Result<RangeData, SourceError> {
        let url = self.workbook_url(&format!(
            "worksheets/{}/usedRange",
            urlencoding::encode(worksheet_id)
        ));
        self.fetch_range(url).await
    }

    /// A specific cell range, e.g. `A2:F500`.
    pub async fn range(
        &self,
        worksheet_id: &str,
        address: &str,
    ) -> Result<RangeData, SourceError> {
        let url = self.workbook_url(&format!(
            "worksheets/{}/range(address='{}')",
            urlencoding::encode(worksheet_id),
            address
        ));
        self.fetch_range(url).await
    }

    async fn fetch_range(&self, url: String) -> Result<RangeData, SourceError> {
        let (status, body) = self.get_json(url).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(RangeData::default());
        }
        if !status.is_success() {
            return Err(Self::graph_error(status, &body));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Connectivity probe: the workbook must resolve and contain at least
    /// one visible worksheet.
    pub async fn check(&self) -> Result<(), SourceError> {
        let worksheets = self.list_worksheets().await?;
        if worksheets.is_empty() {
            return Err(SourceError::Workbook {
                path: self.workbook_path.clone(),
                message: "no visible worksheets found in the workbook".to_string(),
            });
        }
        Ok(())
    }
}

fn graph_error_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

// Percent-encode each path segment, keeping the separators. Graph addresses
// drive items as `/root:/<path>:` and rejects raw spaces.
fn encode_drive_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_drive_path_segments() {
        assert_eq!(encode_drive_path("/Orders.xlsx"), "Orders.xlsx");
        assert_eq!(
            encode_drive_path("/Shared/Team Files/Q4 Data.xlsx"),
            "Shared/Team%20Files/Q4%20Data.xlsx"
        );
    }

    #[test]
    fn parses_graph_range_payload() {
        let range: RangeData = serde_json::from_value(json!({
            "address": "Sheet1!A1:C3",
            "rowCount": 3,
            "columnCount": 3,
            "values": [["a", "b", "c"], [1, 2, 3], [null, null, null]]
        }))
        .unwrap();
        assert_eq!(range.row_count, 3);
        assert_eq!(range.column_count, 3);
        assert_eq!(range.values.len(), 3);
    }

    #[test]
    fn extracts_graph_error_message() {
        let body = json!({"error": {"code": "itemNotFound", "message": "The resource could not be found."}});
        assert_eq!(graph_error_message(&body), "The resource could not be found.");
        assert_eq!(graph_error_message(&Value::Null), "unknown error");
    }

    #[test]
    fn visibility_filter_only_accepts_visible() {
        let visible: Worksheet = serde_json::from_value(json!({
            "id": "{1}", "name": "Data", "visibility": "Visible"
        }))
        .unwrap();
        let hidden: Worksheet = serde_json::from_value(json!({
            "id": "{2}", "name": "Internals", "visibility": "Hidden"
        }))
        .unwrap();
        let unknown: Worksheet =
            serde_json::from_value(json!({ "id": "{3}", "name": "NoFlag" })).unwrap();
        assert!(visible.is_visible());
        assert!(!hidden.is_visible());
        assert!(!unknown.is_visible());
    }
}
