use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{action, optional_str, page_result, required_str, unknown_action};
use crate::api::message::{text_content, MessageApi};

const ACTIONS: &str = "send | reply | list";

/// Send, reply to and list IM messages.
pub struct FeishuMessageTool {
    api: MessageApi,
}

impl FeishuMessageTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            api: MessageApi::new(client),
        }
    }
}

/// `(msg_type, content)` from either `text` or an explicit `msg_type` +
/// `content` pair.
fn message_body(args: &Value) -> Result<(String, String), FeishuError> {
    let msg_type = optional_str(args, "msg_type").unwrap_or("text");
    if msg_type == "text" {
        if let Some(text) = optional_str(args, "text") {
            return Ok(("text".to_string(), text_content(text)));
        }
    }
    let content = match args.get("content") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v @ Value::Object(_)) => v.to_string(),
        _ if msg_type == "text" => return Err(FeishuError::Tool("missing 'text'".to_string())),
        _ => return Err(FeishuError::Tool("missing 'content'".to_string())),
    };
    Ok((msg_type.to_string(), content))
}

#[async_trait]
impl Tool for FeishuMessageTool {
    fn name(&self) -> &'static str {
        "feishu_message"
    }

    fn description(&self) -> &'static str {
        "Send FeiShu messages. \
         action='send' sends to a chat or user; \
         action='reply' replies to a message; \
         action='list' reads a chat's history. \
         Plain text goes in 'text'; other types take 'msg_type' and a JSON 'content'."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["send", "reply", "list"] },
                "receive_id": {
                    "type": "string",
                    "description": "Recipient for send"
                },
                "receive_id_type": {
                    "type": "string",
                    "enum": ["chat_id", "open_id", "user_id", "union_id", "email"],
                    "description": "Kind of receive_id (default chat_id)"
                },
                "message_id": {
                    "type": "string",
                    "description": "Message to reply to (om_xxx)"
                },
                "chat_id": {
                    "type": "string",
                    "description": "Chat whose history to list"
                },
                "text": { "type": "string" },
                "msg_type": {
                    "type": "string",
                    "description": "text (default), post, interactive, image, ..."
                },
                "content": {
                    "description": "Message content for non-text types, as an object or JSON string"
                },
                "reply_in_thread": { "type": "boolean" },
                "start_time": { "type": "string", "description": "Unix seconds" },
                "end_time": { "type": "string", "description": "Unix seconds" },
                "page_token": { "type": "string" }
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        match action(&args)? {
            "send" => {
                let receive_id = required_str(&args, "receive_id")?;
                let id_type = optional_str(&args, "receive_id_type").unwrap_or("chat_id");
                let (msg_type, content) = message_body(&args)?;
                let message = self
                    .api
                    .send(id_type, receive_id, &msg_type, content)
                    .await?;
                Ok(json!({ "message_id": message["message_id"], "message": message }))
            }

            "reply" => {
                let message_id = required_str(&args, "message_id")?;
                let (msg_type, content) = message_body(&args)?;
                let in_thread = args
                    .get("reply_in_thread")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let message = self
                    .api
                    .reply(message_id, &msg_type, content, in_thread)
                    .await?;
                Ok(json!({ "message_id": message["message_id"], "message": message }))
            }

            "list" => {
                let chat_id = required_str(&args, "chat_id")?;
                let page = self
                    .api
                    .list(
                        chat_id,
                        optional_str(&args, "start_time"),
                        optional_str(&args, "end_time"),
                        optional_str(&args, "page_token"),
                    )
                    .await?;
                Ok(page_result("messages", page))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
