//! Google Sheets API v4 backend.
//!
//! | operation       | request                                                        |
//! |-----------------|----------------------------------------------------------------|
//! | `open`          | `GET  {key}?fields=sheets.properties`                          |
//! | `column_values` | `GET  {key}/values/{'Title'!A:A}?majorDimension=COLUMNS`       |
//! | `update_cell`   | `PUT  {key}/values/{'Title'!B3}?valueInputOption=USER_ENTERED` |
//! | `append_row`    | `POST {key}/values/{'Title'!A1}:append?...&insertDataOption=INSERT_ROWS` |
//!
//! Authentication is a bearer token obtained outside this tool.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{SyncConfig, ACCESS_TOKEN_ENV, HTTP_TIMEOUT, SHEETS_API_BASE};
use crate::error::{StoreError, SyncError};
use crate::store::{CellValue, TabularStore, Worksheet};

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// HTTP client for the Sheets API.
#[derive(Debug, Clone)]
pub struct SheetsStore {
    agent: ureq::Agent,
    token: String,
    base_url: String,
}

impl SheetsStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
            token: token.into(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Requires an access token in the configuration.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let token = config.access_token.clone().ok_or_else(|| {
            SyncError::Configuration(format!("no API access token; export {ACCESS_TOKEN_ENV}"))
        })?;
        Ok(Self::new(token))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TabularStore for SheetsStore {
    type Sheet = SheetsWorksheet;

    fn open(&mut self, key: &str) -> Result<Vec<SheetsWorksheet>, StoreError> {
        let spreadsheet_url = format!("{}/{}", self.base_url, urlencoding::encode(key));
        let request = self
            .agent
            .get(&spreadsheet_url)
            .query("fields", "sheets.properties");
        let meta: SpreadsheetMeta = call_json(request, &self.token, &spreadsheet_url, None)?;
        tracing::debug!(sheets = meta.sheets.len(), "opened spreadsheet");

        Ok(meta
            .sheets
            .into_iter()
            .map(|s| SheetsWorksheet {
                agent: self.agent.clone(),
                token: self.token.clone(),
                spreadsheet_url: spreadsheet_url.clone(),
                title: s.properties.title,
                row_capacity: s.properties.grid_properties.row_count,
            })
            .collect())
    }
}

/// One worksheet of a remote spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsWorksheet {
    agent: ureq::Agent,
    token: String,
    spreadsheet_url: String,
    title: String,
    row_capacity: usize,
}

impl SheetsWorksheet {
    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url,
            urlencoding::encode(range)
        )
    }
}

impl Worksheet for SheetsWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    fn column_values(&self, col: usize) -> Result<Vec<String>, StoreError> {
        let letter = column_letter(col).ok_or(StoreError::OutOfRange { row: 1, col })?;
        let range = format!("{}!{letter}:{letter}", quote_title(&self.title));
        let url = self.values_url(&range);
        let request = self.agent.get(&url).query("majorDimension", "COLUMNS");
        let body: ValueRange = call_json(request, &self.token, &url, None)?;

        Ok(body
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect())
    }

    fn update_cell(&mut self, row: usize, col: usize, value: &CellValue) -> Result<(), StoreError> {
        let range = cell_range(&self.title, row, col).ok_or(StoreError::OutOfRange { row, col })?;
        let url = self.values_url(&range);
        let request = self
            .agent
            .put(&url)
            .query("valueInputOption", "USER_ENTERED");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [[cell_json(value)]] });
        let _: Value = call_json(request, &self.token, &url, Some(body))?;
        Ok(())
    }

    fn append_row(&mut self, values: &[CellValue]) -> Result<(), StoreError> {
        let range = format!("{}!A1", quote_title(&self.title));
        let url = format!("{}:append", self.values_url(&range));
        let request = self
            .agent
            .post(&url)
            .query("valueInputOption", "USER_ENTERED")
            .query("insertDataOption", "INSERT_ROWS");
        let row: Vec<Value> = values.iter().map(cell_json).collect();
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [row] });
        let _: Value = call_json(request, &self.token, &url, Some(body))?;
        self.row_capacity += 1;
        Ok(())
    }
}

fn call_json<T: DeserializeOwned>(
    request: ureq::Request,
    token: &str,
    url: &str,
    body: Option<Value>,
) -> Result<T, StoreError> {
    let request = request.set("Authorization", &format!("Bearer {token}"));
    let response = match body {
        Some(body) => request.send_json(body),
        None => request.call(),
    }
    .map_err(|e| map_ureq(url, e))?;
    response.into_json().map_err(|source| StoreError::Decode {
        url: url.to_string(),
        source,
    })
}

fn map_ureq(url: &str, err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => StoreError::Http {
            status,
            url: url.to_string(),
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => StoreError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Sheets clears a cell on `""`; `null` would leave it untouched.
fn cell_json(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => json!(""),
        CellValue::Int(n) => json!(n),
        CellValue::Float(x) => json!(x),
        CellValue::Text(s) => json!(s),
    }
}

/// `1 → A`, `26 → Z`, `27 → AA`. `None` for column 0.
fn column_letter(col: usize) -> Option<String> {
    if col == 0 {
        return None;
    }
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).ok()
}

fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_range(title: &str, row: usize, col: usize) -> Option<String> {
    if row == 0 {
        return None;
    }
    Some(format!("{}!{}{row}", quote_title(title), column_letter(col)?))
}
