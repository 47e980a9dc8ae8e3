use std::sync::Arc;

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// Users and departments (`/contact/v3`).
pub struct ContactApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(ContactApi);

impl ContactApi {
    /// `id_type` is `open_id`, `union_id` or `user_id`.
    pub async fn get_user(&self, user_id: &str, id_type: &str) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .path_param("user_id", user_id)
            .query("user_id_type", id_type);
        let data: Value = self
            .client
            .get("/contact/v3/users/:user_id", options)
            .await?;
        Ok(take(data, "user"))
    }

    /// Resolve emails and mobile numbers to open_ids.
    pub async fn batch_get_id(
        &self,
        emails: &[String],
        mobiles: &[String],
    ) -> Result<Value, FeishuError> {
        let mut body = json!({});
        if !emails.is_empty() {
            body["emails"] = json!(emails);
        }
        if !mobiles.is_empty() {
            body["mobiles"] = json!(mobiles);
        }
        let options = self
            .options()
            .query("user_id_type", "open_id")
            .json(body);
        let data: Value = self
            .client
            .post("/contact/v3/users/batch_get_id", options)
            .await?;
        Ok(take(data, "user_list"))
    }

    /// Sub-departments of `parent_id` (the root department when absent).
    pub async fn list_departments(
        &self,
        parent_id: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .path_param("department_id", parent_id.unwrap_or("0"))
            .query("department_id_type", "open_department_id")
            .query("fetch_child", false)
            .query_opt("page_token", page_token);
        self.client
            .get_list("/contact/v3/departments/:department_id/children", options)
            .await
    }

    pub async fn get_department(
        &self,
        department_id: &str,
        id_type: &str,
    ) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .path_param("department_id", department_id)
            .query("department_id_type", id_type);
        let data: Value = self
            .client
            .get("/contact/v3/departments/:department_id", options)
            .await?;
        Ok(take(data, "department"))
    }
}
