use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{action, optional_str, page_result, required_str, string_list, unknown_action};
use crate::api::ContactApi;

const ACTIONS: &str = "get_user | batch_get_id | list_departments | get_department";

/// Look up FeiShu users and departments.
pub struct FeishuContactTool {
    api: ContactApi,
}

impl FeishuContactTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            api: ContactApi::new(client),
        }
    }
}

#[async_trait]
impl Tool for FeishuContactTool {
    fn name(&self) -> &'static str {
        "feishu_contact"
    }

    fn description(&self) -> &'static str {
        "Look up the FeiShu directory. \
         action='get_user' fetches a user; \
         action='batch_get_id' resolves emails or mobiles to open_ids; \
         action='list_departments' lists sub-departments; \
         action='get_department' fetches a department."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["get_user", "batch_get_id", "list_departments", "get_department"]
                },
                "user_id": { "type": "string" },
                "user_id_type": {
                    "type": "string",
                    "enum": ["open_id", "union_id", "user_id"],
                    "description": "Kind of user_id (default open_id)"
                },
                "emails": { "type": "array", "items": { "type": "string" } },
                "mobiles": { "type": "array", "items": { "type": "string" } },
                "department_id": {
                    "type": "string",
                    "description": "Required for get_department; parent for list_departments (default root)"
                },
                "department_id_type": {
                    "type": "string",
                    "enum": ["open_department_id", "department_id"]
                },
                "page_token": { "type": "string" }
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        match action(&args)? {
            "get_user" => {
                let user_id = required_str(&args, "user_id")?;
                let id_type = optional_str(&args, "user_id_type").unwrap_or("open_id");
                let user = self.api.get_user(user_id, id_type).await?;
                Ok(json!({ "user": user }))
            }

            "batch_get_id" => {
                let emails = string_list(&args, "emails");
                let mobiles = string_list(&args, "mobiles");
                if emails.is_empty() && mobiles.is_empty() {
                    return Err(FeishuError::Tool("missing 'emails' or 'mobiles'".to_string()));
                }
                let users = self.api.batch_get_id(&emails, &mobiles).await?;
                Ok(json!({ "users": users }))
            }

            "list_departments" => {
                let page = self
                    .api
                    .list_departments(
                        optional_str(&args, "department_id"),
                        optional_str(&args, "page_token"),
                    )
                    .await?;
                Ok(page_result("departments", page))
            }

            "get_department" => {
                let department_id = required_str(&args, "department_id")?;
                let id_type =
                    optional_str(&args, "department_id_type").unwrap_or("open_department_id");
                let department = self.api.get_department(department_id, id_type).await?;
                Ok(json!({ "department": department }))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
