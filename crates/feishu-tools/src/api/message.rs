use std::sync::Arc;

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::api_wrapper;

/// IM messages (`/im/v1/messages`).
///
/// `content` is the JSON-encoded string FeiShu expects for `msg_type`, e.g.
/// `{"text":"hi"}` for `text`. See [`text_content`].
pub struct MessageApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(MessageApi);

/// Content string for a plain `text` message.
pub fn text_content(text: &str) -> String {
    json!({ "text": text }).to_string()
}

impl MessageApi {
    /// Send a message. `receive_id_type` is one of `open_id`, `user_id`,
    /// `union_id`, `email`, `chat_id`.
    pub async fn send(
        &self,
        receive_id_type: &str,
        receive_id: &str,
        msg_type: &str,
        content: String,
    ) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .query("receive_id_type", receive_id_type)
            .json(json!({
                "receive_id": receive_id,
                "msg_type": msg_type,
                "content": content,
            }));
        self.client.post("/im/v1/messages", options).await
    }

    /// Reply to `message_id`, optionally inside its thread.
    pub async fn reply(
        &self,
        message_id: &str,
        msg_type: &str,
        content: String,
        in_thread: bool,
    ) -> Result<Value, FeishuError> {
        let mut body = json!({ "msg_type": msg_type, "content": content });
        if in_thread {
            body["reply_in_thread"] = json!(true);
        }
        let options = self
            .options()
            .path_param("message_id", message_id)
            .json(body);
        self.client
            .post("/im/v1/messages/:message_id/reply", options)
            .await
    }

    /// One page of a chat's history. Times are Unix seconds.
    pub async fn list(
        &self,
        chat_id: &str,
        start_time: Option<&str>,
        end_time: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .query("container_id_type", "chat")
            .query("container_id", chat_id)
            .query_opt("start_time", start_time)
            .query_opt("end_time", end_time)
            .query_opt("page_token", page_token)
            .query("page_size", 50);
        self.client.get_list("/im/v1/messages", options).await
    }
}
