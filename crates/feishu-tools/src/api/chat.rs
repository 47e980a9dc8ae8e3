use std::sync::Arc;

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// Group chats (`/im/v1/chats`).
pub struct ChatApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(ChatApi);

impl ChatApi {
    /// One page of the chats the bot (or user) belongs to.
    pub async fn list_chats(
        &self,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .query("page_size", page_size.unwrap_or(50))
            .query_opt("page_token", page_token);
        self.client.get_list("/im/v1/chats", options).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Value, FeishuError> {
        let options = self.options().path_param("chat_id", chat_id);
        self.client.get("/im/v1/chats/:chat_id", options).await
    }

    /// Create a group chat and return its `chat_id`.
    pub async fn create_chat(
        &self,
        name: &str,
        description: Option<&str>,
        open_ids: &[String],
    ) -> Result<String, FeishuError> {
        let mut body = json!({ "name": name });
        if let Some(desc) = description {
            body["description"] = json!(desc);
        }
        if !open_ids.is_empty() {
            body["user_id_list"] = json!(open_ids);
        }
        let options = self
            .options()
            .query("user_id_type", "open_id")
            .json(body);
        let data: Value = self.client.post("/im/v1/chats", options).await?;
        match take(data, "chat_id") {
            Value::String(chat_id) => Ok(chat_id),
            _ => Err(FeishuError::MissingFields(vec!["chat_id".to_string()])),
        }
    }

    pub async fn list_members(
        &self,
        chat_id: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .path_param("chat_id", chat_id)
            .query("member_id_type", "open_id")
            .query_opt("page_token", page_token);
        self.client
            .get_list("/im/v1/chats/:chat_id/members", options)
            .await
    }

    /// Add members by open_id. Returns the ids FeiShu rejected.
    pub async fn add_members(
        &self,
        chat_id: &str,
        open_ids: &[String],
    ) -> Result<Vec<String>, FeishuError> {
        let options = self
            .options()
            .path_param("chat_id", chat_id)
            .query("member_id_type", "open_id")
            .json(json!({ "id_list": open_ids }));
        let data: Value = self
            .client
            .post("/im/v1/chats/:chat_id/members", options)
            .await?;
        Ok(take(data, "invalid_id_list")
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}
