mod common;

use std::error::Error as _;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use common::{settle, FailingCache, MockFeishu, RecordingCache, REFRESH_TOKEN_PATH, TENANT_TOKEN_PATH, USER_TOKEN_PATH};
use feishu_client::{ApiClient, TENANT_TOKEN_KEY, USER_TOKEN_KEY, REFRESH_TOKEN_KEY};
use feishu_core::{Cache, FeishuError, LogLevel};
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, ResponseTemplate,
};

// ── Tenant token ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn tenant_token_is_fetched_once_then_served_from_cache() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .and(body_json(json!({ "app_id": "a1", "app_secret": "s1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "tenant_access_token": "T",
            "expire": 7200
        })))
        .expect(1)
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    let first = client.tokens().get_tenant_access_token().await.unwrap();
    assert_eq!(first, "T");

    settle().await;

    let second = client.tokens().get_tenant_access_token().await.unwrap();
    assert_eq!(second, "T");
    assert_eq!(feishu.requests_to(TENANT_TOKEN_PATH).await.len(), 1);
}

#[tokio::test]
async fn cached_expiry_is_shortened_by_the_margin() {
    let feishu = MockFeishu::start().await;
    feishu.mock_tenant_token("T", 7200).await;
    let cache = Arc::new(RecordingCache::default());
    let client = ApiClient::new(feishu.config("a1", "s1").with_cache(cache.clone()));

    let fetched_at = SystemTime::now();
    client.tokens().get_tenant_access_token().await.unwrap();
    settle().await;

    let expires_at = cache.expiry_of(TENANT_TOKEN_KEY).expect("token cached");
    let expected = fetched_at + Duration::from_secs(7020);
    let drift = expires_at
        .duration_since(expected)
        .unwrap_or_else(|e| e.duration());
    assert!(drift <= Duration::from_secs(1), "drift {drift:?}");

    let sets = cache.sets.lock().unwrap();
    assert_eq!(sets[0].1.as_deref(), Some("a1"), "namespaced by app id");
}

#[tokio::test]
async fn tokens_from_different_apps_do_not_collide() {
    let feishu = MockFeishu::start().await;
    feishu.mock_tenant_token("T", 7200).await;
    let cache = Arc::new(RecordingCache::default());
    cache
        .set(TENANT_TOKEN_KEY, json!("other-app-token"), None, Some("a2"))
        .await
        .unwrap();

    let client = ApiClient::new(feishu.config("a1", "s1").with_cache(cache));
    assert_eq!(client.tokens().get_tenant_access_token().await.unwrap(), "T");
}

#[tokio::test]
async fn unavailable_cache_degrades_to_fetching() {
    let feishu = MockFeishu::start().await;
    feishu.mock_tenant_token("T", 7200).await;
    let client = ApiClient::new(feishu.config("a1", "s1").with_cache(Arc::new(FailingCache)));

    assert_eq!(client.tokens().get_tenant_access_token().await.unwrap(), "T");
    settle().await;
    assert_eq!(client.tokens().get_tenant_access_token().await.unwrap(), "T");
    settle().await;

    assert_eq!(feishu.requests_to(TENANT_TOKEN_PATH).await.len(), 2);
    assert_eq!(client.tokens().cache_write_failures(), 2);
    let warnings = feishu.logger.at(LogLevel::Warn);
    assert!(warnings.iter().any(|r| r.message.contains("reading tenant-access-token")));
    assert!(warnings.iter().any(|r| r.message.contains("caching tenant-access-token failed")));
}

#[tokio::test]
async fn disabled_token_cache_always_fetches() {
    let feishu = MockFeishu::start().await;
    feishu.mock_tenant_token("T", 7200).await;
    let cache = Arc::new(RecordingCache::default());
    let client = ApiClient::new(
        feishu
            .config("a1", "s1")
            .with_cache(cache.clone())
            .with_disable_token_cache(true),
    );

    client.tokens().get_tenant_access_token().await.unwrap();
    settle().await;
    client.tokens().get_tenant_access_token().await.unwrap();
    settle().await;

    assert_eq!(feishu.requests_to(TENANT_TOKEN_PATH).await.len(), 2);
    assert!(cache.sets.lock().unwrap().is_empty());
}

#[tokio::test]
async fn api_error_is_wrapped_into_opaque_fetch_failure() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10014,
            "msg": "app secret invalid"
        })))
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "wrong"));
    let err = client.tokens().get_tenant_access_token().await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to fetch tenant access token");
    let source = err.source().expect("cause kept");
    assert!(source.to_string().contains("10014"), "got: {source}");
    let errors = feishu.logger.at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context.as_ref().unwrap()["code"], 10014);
}

#[tokio::test]
async fn missing_fields_are_reported() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "expire": 7200 })))
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    match client.tokens().get_tenant_access_token().await.unwrap_err() {
        FeishuError::TokenFetch { source, .. } => match *source {
            FeishuError::MissingFields(fields) => assert_eq!(fields, vec!["tenant_access_token"]),
            other => panic!("expected MissingFields, got {other:?}"),
        },
        other => panic!("expected TokenFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn non_object_body_is_an_invalid_format() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    match client.tokens().get_tenant_access_token().await.unwrap_err() {
        FeishuError::TokenFetch { source, .. } => {
            assert!(matches!(*source, FeishuError::InvalidResponseFormat(_)), "got {source:?}")
        }
        other => panic!("expected TokenFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_keeps_status_and_body_in_log_context() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    let err = client.tokens().get_tenant_access_token().await.unwrap_err();
    match err {
        FeishuError::TokenFetch { source, .. } => match *source {
            FeishuError::Transport(ref t) => {
                assert_eq!(t.status, Some(503));
                assert_eq!(t.method, "POST");
                assert!(t.url.ends_with(TENANT_TOKEN_PATH));
            }
            ref other => panic!("expected Transport, got {other:?}"),
        },
        other => panic!("expected TokenFetch, got {other:?}"),
    }

    let errors = feishu.logger.at(LogLevel::Error);
    let context = errors[0].context.as_ref().unwrap();
    assert_eq!(context["status"], 503);
    assert_eq!(context["data"], "upstream unavailable");
}

// ── OAuth helpers ────────────────────────────────────────────────────────────

#[tokio::test]
async fn authorization_url_contains_each_parameter_once() {
    let feishu = MockFeishu::start().await;
    let client = ApiClient::new(feishu.config("a1", "s1"));

    let url = client
        .tokens()
        .generate_authorization_url(Some("https://cb"), Some("scope:a scope:b"), Some("xyz"))
        .unwrap();

    assert!(url.starts_with(&format!("{}/open-apis/authen/v1/index?", feishu.server.uri())));
    assert_eq!(url.matches("app_id=").count(), 1);
    assert_eq!(url.matches("redirect_uri=").count(), 1);
    assert_eq!(url.matches("scope=").count(), 1);
    assert!(url.contains("app_id=a1"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fcb"), "got: {url}");
    assert!(url.contains("scope=scope%3Aa%20scope%3Ab"), "got: {url}");
    assert!(url.contains("state=xyz"));
}

#[tokio::test]
async fn authorization_url_requires_a_redirect_uri() {
    let feishu = MockFeishu::start().await;
    let client = ApiClient::new(feishu.config("a1", "s1"));

    let err = client
        .tokens()
        .generate_authorization_url(None, None, None)
        .unwrap_err();
    assert!(matches!(err, FeishuError::RedirectUriRequired));

    client.tokens().set_redirect_uri("https://stored").unwrap();
    let url = client
        .tokens()
        .generate_authorization_url(None, None, None)
        .unwrap();
    assert!(url.contains("redirect_uri=https%3A%2F%2Fstored"));
    assert!(!url.contains("scope="));
    assert!(!url.contains("state="));
}

#[tokio::test]
async fn setters_reject_empty_values() {
    let feishu = MockFeishu::start().await;
    let client = ApiClient::new(feishu.config("a1", "s1"));

    assert!(matches!(
        client.tokens().set_authorization_code(""),
        Err(FeishuError::EmptyValue(_))
    ));
    assert!(matches!(
        client.tokens().set_redirect_uri(""),
        Err(FeishuError::EmptyValue(_))
    ));
    assert!(!client.tokens().has_authorization_code());
    assert!(client.tokens().redirect_uri().is_none());
}

// ── User token ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_code_error_carries_the_authorization_url() {
    let feishu = MockFeishu::start().await;
    let client = ApiClient::new(feishu.config("a1", "s1").with_redirect_uri("https://cb"));

    let err = client
        .tokens()
        .get_user_access_token(None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, FeishuError::AuthorizationCodeRequired { .. }));
    let message = err.to_string();
    assert!(message.contains("/open-apis/authen/v1/index?app_id=a1"), "got: {message}");
    assert!(feishu.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn code_exchange_caches_access_and_refresh_tokens() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(USER_TOKEN_PATH))
        .and(body_json(json!({
            "grant_type": "authorization_code",
            "code": "code-1",
            "app_id": "a1",
            "app_secret": "s1",
            "redirect_uri": "https://cb"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "user_access_token": "U",
            "refresh_token": "R",
            "expire": 7200
        })))
        .expect(1)
        .mount(&feishu.server)
        .await;

    let cache = Arc::new(RecordingCache::default());
    let client = ApiClient::new(
        feishu
            .config("a1", "s1")
            .with_cache(cache.clone())
            .with_redirect_uri("https://cb"),
    );

    let token = client
        .tokens()
        .get_user_access_token(Some("code-1"), None)
        .await
        .unwrap();
    assert_eq!(token, "U");
    settle().await;

    let access_expiry = cache.expiry_of(USER_TOKEN_KEY).unwrap();
    let refresh_expiry = cache.expiry_of(REFRESH_TOKEN_KEY).unwrap();
    assert_eq!(
        refresh_expiry.duration_since(access_expiry).unwrap(),
        Duration::from_secs(30 * 24 * 60 * 60)
    );
    assert_eq!(
        cache.get(REFRESH_TOKEN_KEY, Some("a1")).await.unwrap(),
        Some(json!("R"))
    );

    // Served from cache, no second exchange.
    let again = client.tokens().get_user_access_token(None, None).await.unwrap();
    assert_eq!(again, "U");
}

#[tokio::test]
async fn redirect_uri_is_omitted_when_not_configured() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(USER_TOKEN_PATH))
        .and(body_json(json!({
            "grant_type": "authorization_code",
            "code": "code-1",
            "app_id": "a1",
            "app_secret": "s1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "user_access_token": "U", "refresh_token": "R", "expire": 7200 }
        })))
        .expect(1)
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    let token = client
        .tokens()
        .get_user_access_token(Some("code-1"), None)
        .await
        .unwrap();
    assert_eq!(token, "U");
}

#[tokio::test]
async fn stored_code_is_used_once() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(USER_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "user_access_token": "U",
            "expire": 7200
        })))
        .expect(1)
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(
        feishu
            .config("a1", "s1")
            .with_redirect_uri("https://cb")
            .with_disable_token_cache(true),
    );
    client.tokens().set_authorization_code("stored-code").unwrap();

    assert_eq!(
        client.tokens().get_user_access_token(None, None).await.unwrap(),
        "U"
    );
    assert!(!client.tokens().has_authorization_code());

    // Cache disabled and code consumed: the user must authorize again.
    let err = client
        .tokens()
        .get_user_access_token(None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeishuError::AuthorizationCodeRequired { .. }));
}

#[tokio::test]
async fn cached_refresh_token_is_exchanged_before_asking_for_a_code() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_TOKEN_PATH))
        .and(body_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "R-old",
            "app_id": "a1",
            "app_secret": "s1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "user_access_token": "U-new",
            "refresh_token": "R-new",
            "expire": 7200
        })))
        .expect(1)
        .mount(&feishu.server)
        .await;

    let cache = Arc::new(RecordingCache::default());
    cache
        .set(REFRESH_TOKEN_KEY, json!("R-old"), None, Some("a1"))
        .await
        .unwrap();
    let client = ApiClient::new(feishu.config("a1", "s1").with_cache(cache.clone()));

    let token = client.tokens().get_user_access_token(None, None).await.unwrap();
    assert_eq!(token, "U-new");
    settle().await;
    assert_eq!(
        cache.get(REFRESH_TOKEN_KEY, Some("a1")).await.unwrap(),
        Some(json!("R-new"))
    );
}

#[tokio::test]
async fn failed_code_exchange_is_wrapped() {
    let feishu = MockFeishu::start().await;
    Mock::given(method("POST"))
        .and(path(USER_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 20003,
            "msg": "invalid code"
        })))
        .mount(&feishu.server)
        .await;

    let client = ApiClient::new(feishu.config("a1", "s1"));
    let err = client
        .tokens()
        .get_user_access_token(Some("bad"), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch user access token");
}
