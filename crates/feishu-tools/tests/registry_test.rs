mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{mock_feishu, offline_client, ok};
use feishu_core::FeishuError;
use feishu_tools::{Tool, ToolContent, ToolRegistry};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock,
};

struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Echo the input back"
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        Ok(args)
    }
}

#[test]
fn feishu_tools_are_all_registered() {
    let registry = ToolRegistry::with_feishu_tools(offline_client());
    let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec![
            "feishu_calendar",
            "feishu_chat",
            "feishu_contact",
            "feishu_document",
            "feishu_message",
            "feishu_sheet",
            "feishu_task",
        ]
    );
}

#[test]
fn definitions_serialize_with_input_schema() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(Echo));

    let definitions = serde_json::to_value(registry.list_tools()).unwrap();
    assert_eq!(
        definitions,
        json!([{
            "name": "echo",
            "description": "Echo the input back",
            "inputSchema": { "type": "object", "properties": {} }
        }])
    );
}

#[test]
fn registering_a_name_twice_replaces() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(Echo));
    registry.register(Arc::new(Echo));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn unknown_tool_is_an_error() {
    let registry = ToolRegistry::new();
    let err = registry.call_tool("nope", json!({})).await.unwrap_err();
    assert!(matches!(err, FeishuError::ToolNotFound(ref name) if name == "nope"));
}

#[tokio::test]
async fn string_results_are_passed_through() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(Echo));

    let result = registry.call_tool("echo", json!("hello")).await.unwrap();
    assert!(!result.is_error);
    assert_eq!(
        result.content,
        vec![ToolContent::Text {
            text: "hello".into()
        }]
    );
}

#[tokio::test]
async fn tool_failures_become_error_results() {
    let registry = ToolRegistry::with_feishu_tools(offline_client());
    let result = registry
        .call_tool("feishu_chat", json!({ "action": "get" }))
        .await
        .unwrap();

    assert!(result.is_error);
    assert_eq!(result.joined_text(), "tool error: missing 'chat_id'");
}

#[tokio::test]
async fn successful_call_renders_json_text() {
    let (server, client) = mock_feishu().await;
    Mock::given(method("GET"))
        .and(path("/open-apis/contact/v3/users/ou_1"))
        .respond_with(ok(json!({ "user": { "open_id": "ou_1", "name": "Ada" } })))
        .mount(&server)
        .await;

    let registry = ToolRegistry::with_feishu_tools(client);
    let result = registry
        .call_tool(
            "feishu_contact",
            json!({ "action": "get_user", "user_id": "ou_1" }),
        )
        .await
        .unwrap();

    assert!(!result.is_error);
    let parsed: Value = serde_json::from_str(&result.joined_text()).unwrap();
    assert_eq!(parsed["user"]["name"], "Ada");
}
