//! FeiShu resource APIs and the agent tools built on them.
//!
//! - [`api`]: typed wrappers per resource family over one shared
//!   [`ApiClient`](feishu_client::ApiClient)
//! - [`tools`]: `action`-dispatched [`Tool`] implementations
//! - [`ToolRegistry`]: serves MCP `tools/list` and `tools/call`
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use feishu_client::{ApiClient, ClientConfig};
//! use feishu_tools::ToolRegistry;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), feishu_core::FeishuError> {
//! let client = Arc::new(ApiClient::new(ClientConfig::new("cli_xxx", "secret_xxx")));
//! let registry = ToolRegistry::with_feishu_tools(client);
//! let result = registry
//!     .call_tool("feishu_chat", json!({ "action": "list" }))
//!     .await?;
//! println!("{}", result.joined_text());
//! # Ok(())
//! # }
//! ```

pub mod api;
mod registry;
pub mod tools;

pub use registry::{CallToolResult, ToolContent, ToolRegistry};
pub use tools::{
    FeishuCalendarTool, FeishuChatTool, FeishuContactTool, FeishuDocumentTool, FeishuMessageTool,
    FeishuSheetTool, FeishuTaskTool,
};

pub use feishu_core::{Tool, ToolDefinition};
