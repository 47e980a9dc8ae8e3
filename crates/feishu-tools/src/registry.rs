use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{
    FeishuCalendarTool, FeishuChatTool, FeishuContactTool, FeishuDocumentTool, FeishuMessageTool,
    FeishuSheetTool, FeishuTaskTool,
};

/// One block of a tool result, in MCP's content shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// The result of `tools/call`.
///
/// A failing tool still produces a result, flagged with `isError`, so the
/// calling model can read the message and react.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Tool output rendered as text: strings as-is, anything else as
    /// pretty-printed JSON.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Self::text(s),
            other => Self::text(
                serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
            ),
        }
    }

    /// Concatenated text of every content block.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Thread-safe registry serving `tools/list` and `tools/call`.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every FeiShu tool, all sharing `client`.
    pub fn with_feishu_tools(client: Arc<ApiClient>) -> Self {
        let registry = Self::new();
        let tools: [Arc<dyn Tool>; 7] = [
            Arc::new(FeishuChatTool::new(client.clone())),
            Arc::new(FeishuMessageTool::new(client.clone())),
            Arc::new(FeishuDocumentTool::new(client.clone())),
            Arc::new(FeishuSheetTool::new(client.clone())),
            Arc::new(FeishuCalendarTool::new(client.clone())),
            Arc::new(FeishuTaskTool::new(client.clone())),
            Arc::new(FeishuContactTool::new(client)),
        ];
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Add `tool`, replacing any tool of the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.write().insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .read()
            .values()
            .map(|tool| tool.as_tool_definition())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Run the named tool.
    ///
    /// # Errors
    ///
    /// Only [`FeishuError::ToolNotFound`]. Failures of the tool itself come
    /// back as a result with `is_error` set.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, FeishuError> {
        let tool = self
            .get(name)
            .ok_or_else(|| FeishuError::ToolNotFound(name.to_string()))?;

        tracing::debug!(tool = name, "calling tool");
        match tool.call(args).await {
            Ok(value) => Ok(CallToolResult::from_value(value)),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn Tool>>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn Tool>>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
