use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{action, required_str, unknown_action};
use crate::api::SpreadsheetApi;

const ACTIONS: &str = "get_meta | read | write | append";

/// Read and write FeiShu spreadsheet cells.
pub struct FeishuSheetTool {
    api: SpreadsheetApi,
}

impl FeishuSheetTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            api: SpreadsheetApi::new(client),
        }
    }
}

/// The `values` argument as rows of cells.
fn rows(args: &Value) -> Result<Vec<Vec<Value>>, FeishuError> {
    let rows = args
        .get("values")
        .and_then(Value::as_array)
        .filter(|rows| !rows.is_empty())
        .ok_or_else(|| FeishuError::Tool("missing 'values'".to_string()))?;
    rows.iter()
        .map(|row| {
            row.as_array()
                .cloned()
                .ok_or_else(|| FeishuError::Tool("'values' must be an array of rows".to_string()))
        })
        .collect()
}

#[async_trait]
impl Tool for FeishuSheetTool {
    fn name(&self) -> &'static str {
        "feishu_sheet"
    }

    fn description(&self) -> &'static str {
        "Work with FeiShu spreadsheets. \
         action='get_meta' returns the spreadsheet and its sheets; \
         action='read' reads a range; \
         action='write' overwrites a range; \
         action='append' adds rows after a range. \
         Ranges look like '<sheetId>!A1:C10'."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["get_meta", "read", "write", "append"]
                },
                "spreadsheet_token": { "type": "string" },
                "range": {
                    "type": "string",
                    "description": "Required for read, write, append"
                },
                "values": {
                    "type": "array",
                    "items": { "type": "array" },
                    "description": "Rows of cell values for write and append"
                }
            },
            "required": ["action", "spreadsheet_token"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        let action = action(&args)?;
        if !matches!(action, "get_meta" | "read" | "write" | "append") {
            return Err(unknown_action(action, ACTIONS));
        }
        let token = required_str(&args, "spreadsheet_token")?;

        match action {
            "get_meta" => self.api.get_meta(token).await,

            "read" => {
                let range = required_str(&args, "range")?;
                let values = self.api.read_values(token, range).await?;
                Ok(json!({ "range": range, "values": values }))
            }

            "write" => {
                let range = required_str(&args, "range")?;
                let values = rows(&args)?;
                let written = self.api.write_values(token, range, values).await?;
                Ok(json!({ "status": "written", "result": written }))
            }

            "append" => {
                let range = required_str(&args, "range")?;
                let values = rows(&args)?;
                let appended = self.api.append_values(token, range, values).await?;
                Ok(json!({ "status": "appended", "result": appended }))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
