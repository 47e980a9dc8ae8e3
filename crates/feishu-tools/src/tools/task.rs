use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{
    action, as_user_property, optional_str, page_result, required_str, unknown_action,
    user_access,
};
use crate::api::{TaskApi, TaskDraft};

const ACTIONS: &str = "list | get | create | complete | delete";

/// Manage FeiShu tasks.
pub struct FeishuTaskTool {
    client: Arc<ApiClient>,
}

impl FeishuTaskTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FeishuTaskTool {
    fn name(&self) -> &'static str {
        "feishu_task"
    }

    fn description(&self) -> &'static str {
        "Manage FeiShu tasks. \
         action='list' lists tasks; action='get' fetches one; \
         action='create' creates a task; action='complete' marks it done; \
         action='delete' removes it."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "get", "create", "complete", "delete"]
                },
                "task_guid": {
                    "type": "string",
                    "description": "Required for get, complete, delete"
                },
                "summary": {
                    "type": "string",
                    "description": "Title; required for create"
                },
                "description": { "type": "string" },
                "due": {
                    "type": "string",
                    "description": "Due time as Unix milliseconds"
                },
                "page_token": { "type": "string" },
                "as_user": as_user_property()
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        let api = TaskApi::new(self.client.clone()).with_user_access(user_access(&args));
        match action(&args)? {
            "list" => {
                let page = api.list(optional_str(&args, "page_token")).await?;
                Ok(page_result("tasks", page))
            }

            "get" => {
                let guid = required_str(&args, "task_guid")?;
                let task = api.get(guid).await?;
                Ok(json!({ "task": task }))
            }

            "create" => {
                let draft = TaskDraft {
                    summary: required_str(&args, "summary")?.to_string(),
                    description: optional_str(&args, "description").map(String::from),
                    due: optional_str(&args, "due").map(String::from),
                };
                let task = api.create(&draft).await?;
                Ok(json!({ "task_guid": task["guid"], "task": task }))
            }

            "complete" => {
                let guid = required_str(&args, "task_guid")?;
                let task = api.complete(guid).await?;
                Ok(json!({ "task_guid": guid, "status": "completed", "task": task }))
            }

            "delete" => {
                let guid = required_str(&args, "task_guid")?;
                api.delete(guid).await?;
                Ok(json!({ "task_guid": guid, "status": "deleted" }))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
