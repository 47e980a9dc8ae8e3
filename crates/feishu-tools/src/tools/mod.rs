//! Agent tools, one per resource family, each dispatching on an `action`
//! argument.

pub mod calendar;
pub mod chat;
pub mod contact;
pub mod document;
pub mod message;
pub mod spreadsheet;
pub mod task;

pub use calendar::FeishuCalendarTool;
pub use chat::FeishuChatTool;
pub use contact::FeishuContactTool;
pub use document::FeishuDocumentTool;
pub use message::FeishuMessageTool;
pub use spreadsheet::FeishuSheetTool;
pub use task::FeishuTaskTool;

use feishu_client::ListPage;
use feishu_core::FeishuError;
use serde_json::{json, Value};

pub(crate) fn action(args: &Value) -> Result<&str, FeishuError> {
    required_str(args, "action")
}

/// A non-empty string argument, or `missing '<name>'`.
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, FeishuError> {
    optional_str(args, name).ok_or_else(|| FeishuError::Tool(format!("missing '{name}'")))
}

pub(crate) fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// String elements of an array argument; absent or non-array yields empty.
pub(crate) fn string_list(args: &Value, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether the caller asked to act as the authorized user.
pub(crate) fn user_access(args: &Value) -> bool {
    args.get("as_user").and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn unknown_action(action: &str, expected: &str) -> FeishuError {
    FeishuError::Tool(format!("unknown action '{action}': expected {expected}"))
}

/// `{ <key>: items, next_page_token? }` for a list action.
pub(crate) fn page_result(key: &str, page: ListPage<Value>) -> Value {
    let next = page.next_page_token().map(String::from);
    let mut result = json!({ key: page.items });
    if let Some(token) = next {
        result["next_page_token"] = json!(token);
    }
    result
}

/// Schema fragment shared by tools that can act as the user.
pub(crate) fn as_user_property() -> Value {
    json!({
        "type": "boolean",
        "description": "Act as the authorized user instead of the app (requires a prior OAuth authorization)"
    })
}
