use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{action, optional_str, page_result, required_str, string_list, unknown_action};
use crate::api::ChatApi;

const ACTIONS: &str = "list | get | create | list_members | add_members";

/// Manage FeiShu group chats.
///
/// | Action         | Required arguments            |
/// |----------------|-------------------------------|
/// | `list`         |                               |
/// | `get`          | `chat_id`                     |
/// | `create`       | `name`                        |
/// | `list_members` | `chat_id`                     |
/// | `add_members`  | `chat_id`, `member_open_ids`  |
pub struct FeishuChatTool {
    api: ChatApi,
}

impl FeishuChatTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            api: ChatApi::new(client),
        }
    }
}

#[async_trait]
impl Tool for FeishuChatTool {
    fn name(&self) -> &'static str {
        "feishu_chat"
    }

    fn description(&self) -> &'static str {
        "Manage FeiShu group chats. \
         action='list' lists chats the bot is in; \
         action='get' fetches one chat; \
         action='create' creates a group chat; \
         action='list_members' lists its members; \
         action='add_members' adds members by open_id."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "get", "create", "list_members", "add_members"]
                },
                "chat_id": {
                    "type": "string",
                    "description": "Chat ID (oc_xxx); required for get, list_members, add_members"
                },
                "name": {
                    "type": "string",
                    "description": "Group name; required for create"
                },
                "description": { "type": "string" },
                "member_open_ids": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Member open_ids for create and add_members"
                },
                "page_token": { "type": "string" }
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        match action(&args)? {
            "list" => {
                let page = self
                    .api
                    .list_chats(optional_str(&args, "page_token"), None)
                    .await?;
                Ok(page_result("chats", page))
            }

            "get" => {
                let chat_id = required_str(&args, "chat_id")?;
                let chat = self.api.get_chat(chat_id).await?;
                Ok(json!({ "chat": chat }))
            }

            "create" => {
                let name = required_str(&args, "name")?;
                let open_ids = string_list(&args, "member_open_ids");
                let chat_id = self
                    .api
                    .create_chat(name, optional_str(&args, "description"), &open_ids)
                    .await?;
                Ok(json!({ "chat_id": chat_id }))
            }

            "list_members" => {
                let chat_id = required_str(&args, "chat_id")?;
                let page = self
                    .api
                    .list_members(chat_id, optional_str(&args, "page_token"))
                    .await?;
                Ok(page_result("members", page))
            }

            "add_members" => {
                let chat_id = required_str(&args, "chat_id")?;
                let open_ids = string_list(&args, "member_open_ids");
                if open_ids.is_empty() {
                    return Err(FeishuError::Tool("missing 'member_open_ids'".to_string()));
                }
                let invalid = self.api.add_members(chat_id, &open_ids).await?;
                Ok(json!({ "status": "added", "invalid_open_ids": invalid }))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
