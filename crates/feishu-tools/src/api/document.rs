use std::sync::Arc;

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// New-style documents (`/docx/v1/documents`).
pub struct DocumentApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(DocumentApi);

impl DocumentApi {
    /// Create an empty document, in `folder_token` or the app's root.
    pub async fn create(
        &self,
        title: Option<&str>,
        folder_token: Option<&str>,
    ) -> Result<Value, FeishuError> {
        let mut body = json!({});
        if let Some(title) = title {
            body["title"] = json!(title);
        }
        if let Some(folder) = folder_token {
            body["folder_token"] = json!(folder);
        }
        let data: Value = self
            .client
            .post("/docx/v1/documents", self.options().json(body))
            .await?;
        Ok(take(data, "document"))
    }

    pub async fn get(&self, document_id: &str) -> Result<Value, FeishuError> {
        let options = self.options().path_param("document_id", document_id);
        let data: Value = self
            .client
            .get("/docx/v1/documents/:document_id", options)
            .await?;
        Ok(take(data, "document"))
    }

    /// The document as plain text.
    pub async fn raw_content(&self, document_id: &str) -> Result<String, FeishuError> {
        let options = self
            .options()
            .path_param("document_id", document_id)
            .query("lang", 0);
        let data: Value = self
            .client
            .get("/docx/v1/documents/:document_id/raw_content", options)
            .await?;
        match take(data, "content") {
            Value::String(content) => Ok(content),
            Value::Null => Ok(String::new()),
            other => Err(FeishuError::InvalidResponseFormat(format!(
                "raw_content is not a string: {other}"
            ))),
        }
    }

    pub async fn list_blocks(
        &self,
        document_id: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .path_param("document_id", document_id)
            .query("page_size", 500)
            .query_opt("page_token", page_token);
        self.client
            .get_list("/docx/v1/documents/:document_id/blocks", options)
            .await
    }
}
