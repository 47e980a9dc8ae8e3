use feishu_core::FeishuError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{code, msg, data}` envelope every FeiShu endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// `data` on success, [`FeishuError::Api`] otherwise.
    pub fn into_result(self) -> Result<Option<T>, FeishuError> {
        if self.code != 0 {
            return Err(FeishuError::Api {
                code: self.code,
                msg: self.msg.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        Ok(self.data)
    }
}

/// One page of a FeiShu list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListPage<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> ListPage<T> {
    /// The token for the following page, if there is one.
    pub fn next_page_token(&self) -> Option<&str> {
        if self.has_more {
            self.page_token.as_deref().filter(|t| !t.is_empty())
        } else {
            None
        }
    }
}

/// Check the envelope of a raw response body and deserialize its `data`.
///
/// A non-zero `code` is a failure no matter what HTTP status carried it.
/// Absent `data` deserializes from `null`, so `()` and `Option<_>` work.
pub fn unwrap_envelope<T: DeserializeOwned>(body: Value) -> Result<T, FeishuError> {
    let kind = type_name(&body);
    let Value::Object(mut map) = body else {
        return Err(FeishuError::InvalidResponseFormat(format!(
            "expected a JSON object envelope, got {kind}"
        )));
    };
    let code = map.get("code").and_then(Value::as_i64).ok_or_else(|| {
        FeishuError::InvalidResponseFormat("envelope has no numeric 'code'".to_string())
    })?;
    if code != 0 {
        let msg = map
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return Err(FeishuError::Api { code, msg });
    }
    let data = map.remove("data").unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| FeishuError::Parsing(format!("response data: {e}")))
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
