use std::sync::Arc;

use feishu_client::ApiClient;
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// Spreadsheets: metadata over `sheets/v3`, cell values over `sheets/v2`.
///
/// Ranges use FeiShu's `<sheetId>!A1:C10` notation.
pub struct SpreadsheetApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(SpreadsheetApi);

impl SpreadsheetApi {
    /// Spreadsheet properties plus its sheets.
    pub async fn get_meta(&self, token: &str) -> Result<Value, FeishuError> {
        let spreadsheet: Value = self
            .client
            .get(
                "/sheets/v3/spreadsheets/:token",
                self.options().path_param("token", token),
            )
            .await?;
        let sheets: Value = self
            .client
            .get(
                "/sheets/v3/spreadsheets/:token/sheets/query",
                self.options().path_param("token", token),
            )
            .await?;
        Ok(json!({
            "spreadsheet": take(spreadsheet, "spreadsheet"),
            "sheets": take(sheets, "sheets"),
        }))
    }

    pub async fn read_values(
        &self,
        token: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, FeishuError> {
        let options = self
            .options()
            .path_param("token", token)
            .path_param("range", range);
        let data: Value = self
            .client
            .get("/sheets/v2/spreadsheets/:token/values/:range", options)
            .await?;
        Ok(take(take(data, "valueRange"), "values")
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.as_array().cloned().unwrap_or_default())
            .collect())
    }

    /// Overwrite `range` with `values`.
    pub async fn write_values(
        &self,
        token: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .path_param("token", token)
            .json(json!({ "valueRange": { "range": range, "values": values } }));
        self.client
            .put("/sheets/v2/spreadsheets/:token/values", options)
            .await
    }

    /// Insert `values` as new rows after the last non-empty row of `range`.
    pub async fn append_values(
        &self,
        token: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .path_param("token", token)
            .query("insertDataOption", "INSERT_ROWS")
            .json(json!({ "valueRange": { "range": range, "values": values } }));
        self.client
            .post("/sheets/v2/spreadsheets/:token/values_append", options)
            .await
    }
}
