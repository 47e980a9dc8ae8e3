#![allow(dead_code)]

use std::sync::Arc;

use feishu_client::{ApiClient, ClientConfig};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// A client whose endpoint nothing listens on; for argument validation only.
pub fn offline_client() -> Arc<ApiClient> {
    Arc::new(ApiClient::new(
        ClientConfig::new("cli_test", "secret_test").with_endpoint("http://127.0.0.1:9"),
    ))
}

/// A mock server that already hands out tenant token `T`, and a client for it.
pub async fn mock_feishu() -> (MockServer, Arc<ApiClient>) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "tenant_access_token": "T",
            "expire": 7200
        })))
        .mount(&server)
        .await;
    let client = Arc::new(ApiClient::new(
        ClientConfig::new("cli_test", "secret_test").with_endpoint(server.uri()),
    ));
    (server, client)
}

/// `{code: 0, data}` envelope.
pub fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "success", "data": data }))
}
