//! Shared fixtures: a mock FeiShu server and capability doubles.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use feishu_cache::InMemoryCache;
use feishu_client::ClientConfig;
use feishu_core::{Cache, FeishuError, RecordingLogger};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
pub const USER_TOKEN_PATH: &str = "/open-apis/authen/v1/access_token";
pub const REFRESH_TOKEN_PATH: &str = "/open-apis/authen/v1/refresh_access_token";

/// Mock FeiShu server plus the config and logger pointed at it.
pub struct MockFeishu {
    pub server: MockServer,
    pub logger: RecordingLogger,
}

impl MockFeishu {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            logger: RecordingLogger::new(),
        }
    }

    pub fn config(&self, app_id: &str, app_secret: &str) -> ClientConfig {
        ClientConfig::new(app_id, app_secret)
            .with_endpoint(self.server.uri())
            .with_logger(Arc::new(self.logger.clone()))
    }

    pub async fn mock_tenant_token(&self, token: &str, expire: u64) {
        Mock::given(method("POST"))
            .and(path(TENANT_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": token,
                "expire": expire,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn requests_to(&self, endpoint: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == endpoint)
            .collect()
    }
}

/// Let spawned background tasks (cache writes) run to completion.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

/// Records every `set` and delegates to an in-memory cache.
#[derive(Default)]
pub struct RecordingCache {
    inner: InMemoryCache,
    pub sets: Mutex<Vec<(String, Option<String>, Option<SystemTime>)>>,
}

impl RecordingCache {
    pub fn expiry_of(&self, key: &str) -> Option<SystemTime> {
        self.sets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _, _)| k == key)
            .and_then(|(_, _, at)| *at)
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn get(&self, key: &str, namespace: Option<&str>) -> Result<Option<Value>, FeishuError> {
        self.inner.get(key, namespace).await
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<SystemTime>,
        namespace: Option<&str>,
    ) -> Result<bool, FeishuError> {
        self.sets.lock().unwrap().push((
            key.to_string(),
            namespace.map(String::from),
            expires_at,
        ));
        self.inner.set(key, value, expires_at, namespace).await
    }
}

/// A cache backend that is down.
pub struct FailingCache;

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str, _namespace: Option<&str>) -> Result<Option<Value>, FeishuError> {
        Err(FeishuError::Cache("connection refused".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: Value,
        _expires_at: Option<SystemTime>,
        _namespace: Option<&str>,
    ) -> Result<bool, FeishuError> {
        Err(FeishuError::Cache("connection refused".to_string()))
    }
}
