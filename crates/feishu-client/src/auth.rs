//! Tenant and user access tokens, cached with an early-expiry margin.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use feishu_cache::InMemoryCache;
use feishu_core::{Cache, FeishuError, LogLevel, Logger, TokenKind, TracingLogger};
use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::config::ClientConfig;
use crate::response::type_name;
use crate::transport::{HttpRequest, HttpTransport};

pub const TENANT_TOKEN_KEY: &str = "tenant-access-token";
pub const USER_TOKEN_KEY: &str = "user-access-token";
pub const REFRESH_TOKEN_KEY: &str = "user-access-token:refresh";

/// Cached tokens are treated as expired this long before the API says so.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(180);
/// Refresh tokens outlive their access token by this much.
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const USER_TOKEN_PATH: &str = "/open-apis/authen/v1/access_token";
const REFRESH_USER_TOKEN_PATH: &str = "/open-apis/authen/v1/refresh_access_token";
const AUTHORIZE_PATH: &str = "/open-apis/authen/v1/index";

/// Required fields of a token body; each group lists accepted spellings.
const TENANT_TOKEN_FIELDS: &[&[&str]] = &[&["tenant_access_token"], &["expire", "expires_in"]];
const USER_TOKEN_FIELDS: &[&[&str]] = &[&["user_access_token"], &["expire", "expires_in"]];

/// A bearer credential and the instant it stops being usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub kind: TokenKind,
    /// Already reduced by [`EXPIRY_MARGIN`].
    pub expires_at: SystemTime,
}

/// Cache expiry for a token fetched at `fetched_at` that the API says lives
/// `expire_secs` seconds.
pub fn cache_expiry(fetched_at: SystemTime, expire_secs: u64) -> SystemTime {
    fetched_at + Duration::from_secs(expire_secs).saturating_sub(EXPIRY_MARGIN)
}

#[derive(Debug, Default)]
struct OAuthState {
    code: Option<String>,
    redirect_uri: Option<String>,
}

/// Produces currently-valid tenant and user access tokens.
///
/// Tokens are cached under the app id as namespace. The cache is best-effort:
/// a failed read counts as a miss and a failed write is only logged, so an
/// unavailable cache means a fresh fetch per call, never a stale token.
///
/// Two callers missing the cache at once both fetch; the later write wins.
pub struct TokenManager {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn Cache>,
    logger: Arc<dyn Logger>,
    oauth: Mutex<OAuthState>,
    cache_write_failures: Arc<AtomicU64>,
}

impl TokenManager {
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        let cache = config
            .cache
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryCache::new()));
        let logger = config
            .logger
            .clone()
            .unwrap_or_else(|| Arc::new(TracingLogger));
        let oauth = OAuthState {
            code: config.authorization_code.clone(),
            redirect_uri: config.redirect_uri.clone(),
        };
        Self {
            config,
            transport,
            cache,
            logger,
            oauth: Mutex::new(oauth),
            cache_write_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of background cache writes that failed since construction.
    pub fn cache_write_failures(&self) -> u64 {
        self.cache_write_failures.load(Ordering::Relaxed)
    }

    // -----------------------------------------------------------------------
    // Tenant token
    // -----------------------------------------------------------------------

    /// A tenant access token, from cache when possible.
    ///
    /// # Errors
    ///
    /// [`FeishuError::TokenFetch`] when no token could be obtained; the
    /// underlying cause is its `source`.
    pub async fn get_tenant_access_token(&self) -> Result<String, FeishuError> {
        if let Some(token) = self.cached(TENANT_TOKEN_KEY).await {
            return Ok(token);
        }

        let token = self
            .fetch_tenant_token()
            .await
            .map_err(|e| self.fetch_failed(TokenKind::Tenant, e))?;
        self.store(TENANT_TOKEN_KEY, token.value.clone(), token.expires_at);
        Ok(token.value)
    }

    async fn fetch_tenant_token(&self) -> Result<AccessToken, FeishuError> {
        let payload = json!({
            "app_id": self.config.credentials.app_id(),
            "app_secret": self.config.credentials.app_secret(),
        });
        let fetched_at = SystemTime::now();
        let body = self.post(TENANT_TOKEN_PATH, payload).await?;
        let fields = token_fields(&body, TENANT_TOKEN_FIELDS)?;
        let (value, expire) = token_and_expiry(fields, "tenant_access_token")?;

        self.logger.info(&format!(
            "fetched tenant access token for {} (expires in {expire}s)",
            self.config.app_id()
        ));
        Ok(AccessToken {
            value,
            kind: TokenKind::Tenant,
            expires_at: cache_expiry(fetched_at, expire),
        })
    }

    // -----------------------------------------------------------------------
    // User token
    // -----------------------------------------------------------------------

    /// A user access token, from cache when possible.
    ///
    /// On a miss the token is obtained, in order, from: the `code` argument,
    /// a cached refresh token, the stored authorization code.
    ///
    /// # Errors
    ///
    /// - [`FeishuError::AuthorizationCodeRequired`] when none of those is
    ///   available; its message carries the URL the user must visit.
    /// - [`FeishuError::RedirectUriRequired`] when that URL cannot be built.
    /// - [`FeishuError::TokenFetch`] when the exchange itself fails.
    pub async fn get_user_access_token(
        &self,
        code: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<String, FeishuError> {
        if let Some(token) = self.cached(USER_TOKEN_KEY).await {
            return Ok(token);
        }

        let stored_redirect = self.oauth().redirect_uri.clone();
        let redirect_uri = redirect_uri
            .filter(|uri| !uri.is_empty())
            .map(String::from)
            .or(stored_redirect);

        if let Some(code) = code.filter(|c| !c.is_empty()) {
            return self.exchange_code(code, redirect_uri.as_deref()).await;
        }

        if let Some(refresh_token) = self.cached(REFRESH_TOKEN_KEY).await {
            match self.refresh_user_token(&refresh_token).await {
                Ok(token) => return Ok(token),
                Err(e) => self.logger.warn(&format!(
                    "refreshing user access token failed, trying the authorization code: {e}"
                )),
            }
        }

        let stored_code = self.oauth().code.clone();
        match stored_code {
            Some(code) => {
                let token = self.exchange_code(&code, redirect_uri.as_deref()).await?;
                // Codes are single-use.
                let mut oauth = self.oauth();
                if oauth.code.as_deref() == Some(code.as_str()) {
                    oauth.code = None;
                }
                Ok(token)
            }
            None => {
                let url = self.generate_authorization_url(redirect_uri.as_deref(), None, None)?;
                self.logger.warn(&format!(
                    "user access token unavailable; authorization required at {url}"
                ));
                Err(FeishuError::AuthorizationCodeRequired { url })
            }
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<String, FeishuError> {
        let mut payload = json!({
            "grant_type": "authorization_code",
            "code": code,
            "app_id": self.config.credentials.app_id(),
            "app_secret": self.config.credentials.app_secret(),
        });
        if let Some(uri) = redirect_uri {
            payload["redirect_uri"] = json!(uri);
        }
        self.fetch_user_token(USER_TOKEN_PATH, payload).await
    }

    async fn refresh_user_token(&self, refresh_token: &str) -> Result<String, FeishuError> {
        let payload = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
            "app_id": self.config.credentials.app_id(),
            "app_secret": self.config.credentials.app_secret(),
        });
        self.fetch_user_token(REFRESH_USER_TOKEN_PATH, payload).await
    }

    async fn fetch_user_token(&self, path: &str, payload: Value) -> Result<String, FeishuError> {
        let fetched_at = SystemTime::now();
        let result = async {
            let body = self.post(path, payload).await?;
            let fields = token_fields(&body, USER_TOKEN_FIELDS)?;
            let (value, expire) = token_and_expiry(fields, "user_access_token")?;
            let refresh = fields
                .get("refresh_token")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(String::from);
            Ok::<_, FeishuError>((value, expire, refresh))
        }
        .await;
        let (value, expire, refresh) = result.map_err(|e| self.fetch_failed(TokenKind::User, e))?;

        let token = AccessToken {
            value,
            kind: TokenKind::User,
            expires_at: cache_expiry(fetched_at, expire),
        };
        self.store(USER_TOKEN_KEY, token.value.clone(), token.expires_at);
        if let Some(refresh) = refresh {
            self.store(
                REFRESH_TOKEN_KEY,
                refresh,
                token.expires_at + REFRESH_TOKEN_LIFETIME,
            );
        }
        self.logger.info(&format!(
            "fetched user access token for {} (expires in {expire}s)",
            self.config.app_id()
        ));
        Ok(token.value)
    }

    // -----------------------------------------------------------------------
    // OAuth helpers
    // -----------------------------------------------------------------------

    /// The URL a user visits to grant an authorization code.
    ///
    /// # Errors
    ///
    /// [`FeishuError::RedirectUriRequired`] if neither the argument nor the
    /// stored configuration provides a redirect URI.
    pub fn generate_authorization_url(
        &self,
        redirect_uri: Option<&str>,
        scope: Option<&str>,
        state: Option<&str>,
    ) -> Result<String, FeishuError> {
        let stored = self.oauth().redirect_uri.clone();
        let redirect_uri = redirect_uri
            .filter(|uri| !uri.is_empty())
            .map(String::from)
            .or(stored)
            .ok_or(FeishuError::RedirectUriRequired)?;

        let mut url = format!(
            "{}{AUTHORIZE_PATH}?app_id={}&redirect_uri={}",
            self.config.endpoint,
            urlencoding::encode(self.config.app_id()),
            urlencoding::encode(&redirect_uri),
        );
        if let Some(scope) = scope.filter(|s| !s.is_empty()) {
            url.push_str(&format!("&scope={}", urlencoding::encode(scope)));
        }
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            url.push_str(&format!("&state={}", urlencoding::encode(state)));
        }
        Ok(url)
    }

    /// Store an authorization code for the next user-token exchange.
    pub fn set_authorization_code(&self, code: impl Into<String>) -> Result<(), FeishuError> {
        let code = code.into();
        if code.is_empty() {
            return Err(FeishuError::EmptyValue("authorization code"));
        }
        self.oauth().code = Some(code);
        Ok(())
    }

    pub fn set_redirect_uri(&self, uri: impl Into<String>) -> Result<(), FeishuError> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(FeishuError::EmptyValue("redirect URI"));
        }
        self.oauth().redirect_uri = Some(uri);
        Ok(())
    }

    pub fn redirect_uri(&self) -> Option<String> {
        self.oauth().redirect_uri.clone()
    }

    pub fn has_authorization_code(&self) -> bool {
        self.oauth().code.is_some()
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn oauth(&self) -> MutexGuard<'_, OAuthState> {
        self.oauth
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn namespace(&self) -> &str {
        self.config.app_id()
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value, FeishuError> {
        let url = format!("{}{path}", self.config.endpoint);
        let request = HttpRequest::new(Method::POST, url).with_json(payload);
        self.transport.request(request).await
    }

    async fn cached(&self, key: &str) -> Option<String> {
        if self.config.disable_token_cache {
            return None;
        }
        match self.cache.get(key, Some(self.namespace())).await {
            Ok(Some(Value::String(token))) if !token.is_empty() => {
                self.logger.debug(&format!("{key} served from cache"));
                Some(token)
            }
            Ok(_) => None,
            Err(e) => {
                self.logger.warn(&format!(
                    "reading {key} from cache failed, fetching a fresh one: {e}"
                ));
                None
            }
        }
    }

    /// Write to the cache in the background; the caller does not wait.
    fn store(&self, key: &str, value: String, expires_at: SystemTime) {
        if self.config.disable_token_cache {
            return;
        }
        let cache = self.cache.clone();
        let logger = self.logger.clone();
        let failures = self.cache_write_failures.clone();
        let namespace = self.namespace().to_string();
        let key = key.to_string();

        tokio::spawn(async move {
            let outcome = cache
                .set(&key, Value::String(value), Some(expires_at), Some(&namespace))
                .await;
            let reason = match outcome {
                Ok(true) => return,
                Ok(false) => "cache rejected the entry".to_string(),
                Err(e) => e.to_string(),
            };
            let total = failures.fetch_add(1, Ordering::Relaxed) + 1;
            logger.log(
                LogLevel::Warn,
                &format!("caching {key} failed: {reason}"),
                Some(&json!({ "key": key, "namespace": namespace, "failures": total })),
            );
        });
    }

    fn fetch_failed(&self, kind: TokenKind, cause: FeishuError) -> FeishuError {
        self.logger.log(
            LogLevel::Error,
            &format!("failed to fetch {kind} access token: {cause}"),
            Some(&cause.log_context()),
        );
        FeishuError::TokenFetch {
            kind,
            source: Box::new(cause),
        }
    }
}

/// Validate a token endpoint body and return the object holding its fields:
/// the top level, or `data` when the top level lacks them.
fn token_fields<'a>(
    body: &'a Value,
    required: &[&[&str]],
) -> Result<&'a Map<String, Value>, FeishuError> {
    let Some(top) = body.as_object() else {
        return Err(FeishuError::InvalidResponseFormat(format!(
            "token response is {}, expected an object",
            type_name(body)
        )));
    };
    let code = top.get("code").and_then(Value::as_i64).ok_or_else(|| {
        FeishuError::InvalidResponseFormat("token response has no numeric 'code'".to_string())
    })?;
    if code != 0 {
        return Err(FeishuError::Api {
            code,
            msg: top
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        });
    }

    let present = |holder: &Map<String, Value>, name: &str| {
        holder.get(name).is_some_and(|v| !v.is_null())
    };
    let token_field = required.first().and_then(|names| names.first()).copied();
    let holder = match top.get("data").and_then(Value::as_object) {
        Some(data) if !token_field.is_some_and(|name| present(top, name)) => data,
        _ => top,
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|names| !names.iter().any(|name| present(holder, *name)))
        .filter_map(|names| names.first().map(|name| name.to_string()))
        .collect();
    if !missing.is_empty() {
        return Err(FeishuError::MissingFields(missing));
    }
    Ok(holder)
}

fn token_and_expiry(
    fields: &Map<String, Value>,
    token_field: &str,
) -> Result<(String, u64), FeishuError> {
    let token = fields
        .get(token_field)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FeishuError::MissingFields(vec![token_field.to_string()]))?;
    let expire = fields
        .get("expire")
        .or_else(|| fields.get("expires_in"))
        .and_then(Value::as_u64)
        .ok_or_else(|| FeishuError::MissingFields(vec!["expire".to_string()]))?;
    Ok((token.to_string(), expire))
}
