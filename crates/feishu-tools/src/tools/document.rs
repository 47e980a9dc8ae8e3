use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{
    action, as_user_property, optional_str, page_result, required_str, unknown_action,
    user_access,
};
use crate::api::DocumentApi;

const ACTIONS: &str = "create | get | raw_content | list_blocks";

/// Create and read FeiShu docx documents.
pub struct FeishuDocumentTool {
    client: Arc<ApiClient>,
}

impl FeishuDocumentTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FeishuDocumentTool {
    fn name(&self) -> &'static str {
        "feishu_document"
    }

    fn description(&self) -> &'static str {
        "Work with FeiShu documents. \
         action='create' creates an empty document; \
         action='get' returns its metadata; \
         action='raw_content' returns its plain text; \
         action='list_blocks' lists its blocks."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "get", "raw_content", "list_blocks"]
                },
                "document_id": {
                    "type": "string",
                    "description": "Document ID; required for everything but create"
                },
                "title": { "type": "string" },
                "folder_token": {
                    "type": "string",
                    "description": "Folder for create (default: the app's root)"
                },
                "page_token": { "type": "string" },
                "as_user": as_user_property()
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        let api = DocumentApi::new(self.client.clone()).with_user_access(user_access(&args));
        match action(&args)? {
            "create" => {
                let document = api
                    .create(
                        optional_str(&args, "title"),
                        optional_str(&args, "folder_token"),
                    )
                    .await?;
                Ok(json!({ "document_id": document["document_id"], "document": document }))
            }

            "get" => {
                let document_id = required_str(&args, "document_id")?;
                let document = api.get(document_id).await?;
                Ok(json!({ "document": document }))
            }

            "raw_content" => {
                let document_id = required_str(&args, "document_id")?;
                let content = api.raw_content(document_id).await?;
                Ok(json!({ "document_id": document_id, "content": content }))
            }

            "list_blocks" => {
                let document_id = required_str(&args, "document_id")?;
                let page = api
                    .list_blocks(document_id, optional_str(&args, "page_token"))
                    .await?;
                Ok(page_result("blocks", page))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
