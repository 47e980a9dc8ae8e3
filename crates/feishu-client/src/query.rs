use feishu_core::FeishuError;
use serde_json::Value;

/// Ordered query parameters.
///
/// Arrays are encoded as repeated keys (`a=1&a=2`), which is what the
/// FeiShu API expects; there is no `a[]=` or JSON-array form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Array values become repeated keys, `null`
    /// values are skipped, nested objects are sent as JSON text.
    pub fn from_value(value: &Value) -> Result<Self, FeishuError> {
        let mut params = Self::new();
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, v) in map {
                    match v {
                        Value::Array(items) => {
                            for item in items {
                                if let Some(s) = scalar_to_string(item) {
                                    params.push(key, s);
                                }
                            }
                        }
                        other => {
                            if let Some(s) = scalar_to_string(other) {
                                params.push(key, s);
                            }
                        }
                    }
                }
            }
            other => {
                return Err(FeishuError::Parsing(format!(
                    "query parameters must be an object, got {other}"
                )))
            }
        }
        Ok(params)
    }

    /// Append a value, keeping earlier values for the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Replace every value for `key` with a single one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every key present in `self` replaces that key's values
    /// in `defaults`.
    pub fn merged_over(&self, defaults: &QueryParams) -> QueryParams {
        let mut merged: Vec<(String, String)> = defaults
            .0
            .iter()
            .filter(|(k, _)| !self.0.iter().any(|(own, _)| own == k))
            .cloned()
            .collect();
        merged.extend(self.0.iter().cloned());
        QueryParams(merged)
    }

    /// Percent-encoded `k=v&k=v` form, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
