use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// Tasks (`/task/v2/tasks`), addressed by GUID.
pub struct TaskApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(TaskApi);

/// A new task. `due` is a Unix timestamp in milliseconds, as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub summary: String,
    pub description: Option<String>,
    pub due: Option<String>,
}

impl TaskApi {
    pub async fn list(&self, page_token: Option<&str>) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .query("page_size", 50)
            .query_opt("page_token", page_token);
        self.client.get_list("/task/v2/tasks", options).await
    }

    pub async fn get(&self, task_guid: &str) -> Result<Value, FeishuError> {
        let data: Value = self
            .client
            .get(
                "/task/v2/tasks/:task_guid",
                self.options().path_param("task_guid", task_guid),
            )
            .await?;
        Ok(take(data, "task"))
    }

    pub async fn create(&self, draft: &TaskDraft) -> Result<Value, FeishuError> {
        let mut body = json!({ "summary": draft.summary });
        if let Some(desc) = &draft.description {
            body["description"] = json!(desc);
        }
        if let Some(due) = &draft.due {
            body["due"] = json!({ "timestamp": due, "is_all_day": false });
        }
        let data: Value = self
            .client
            .post("/task/v2/tasks", self.options().json(body))
            .await?;
        Ok(take(data, "task"))
    }

    /// Mark a task done by stamping `completed_at` with the current time.
    pub async fn complete(&self, task_guid: &str) -> Result<Value, FeishuError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let options = self
            .options()
            .path_param("task_guid", task_guid)
            .json(json!({
                "task": { "completed_at": now_ms.to_string() },
                "update_fields": ["completed_at"],
            }));
        let data: Value = self
            .client
            .patch("/task/v2/tasks/:task_guid", options)
            .await?;
        Ok(take(data, "task"))
    }

    pub async fn delete(&self, task_guid: &str) -> Result<(), FeishuError> {
        let _: Value = self
            .client
            .delete(
                "/task/v2/tasks/:task_guid",
                self.options().path_param("task_guid", task_guid),
            )
            .await?;
        Ok(())
    }
}
