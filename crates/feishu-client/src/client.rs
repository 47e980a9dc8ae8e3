use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use feishu_core::{FeishuError, LogLevel, Logger, TracingLogger};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::auth::TokenManager;
use crate::config::ClientConfig;
use crate::query::QueryParams;
use crate::response::{unwrap_envelope, ListPage};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

/// Per-call request settings. Also used as client-wide defaults, see
/// [`ApiClient::with_defaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub params: QueryParams,
    pub data: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Values for `:name` segments of the request path.
    pub path: Vec<(String, String)>,
    /// Authorize with the user access token instead of the tenant token.
    pub user_access: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl Display) -> Self {
        self.params.set(key, value.to_string());
        self
    }

    /// Add the parameter only when `value` is present.
    pub fn query_opt(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Repeated-key parameter: `key=a&key=b`.
    pub fn query_all<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        for value in values {
            self.params.push(key, value.to_string());
        }
        self
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn json(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn path_param(mut self, name: &str, value: impl Display) -> Self {
        self.path.retain(|(k, _)| k != name);
        self.path.push((name.to_string(), value.to_string()));
        self
    }

    pub fn as_user(mut self) -> Self {
        self.user_access = true;
        self
    }
}

/// Merge per-call options over defaults into an outbound request.
///
/// - `params`, `data` (when both are objects), `headers` and `path` merge
///   shallowly, per-call values winning.
/// - `User-Agent` is set first, so a caller header may override it.
/// - `Authorization` is set last and cannot be overridden.
pub fn format_payload(
    defaults: &RequestOptions,
    method: Method,
    url: &str,
    call: RequestOptions,
    token: &str,
    user_agent: &str,
) -> HttpRequest {
    let mut path_params = defaults.path.clone();
    for (name, value) in call.path {
        path_params.retain(|(k, _)| *k != name);
        path_params.push((name, value));
    }

    let mut request = HttpRequest::new(method, substitute_path(url, &path_params));
    request.query = call.params.merged_over(&defaults.params);
    request.body = match (defaults.data.as_ref(), call.data) {
        (Some(Value::Object(base)), Some(Value::Object(over))) => {
            let mut merged = base.clone();
            merged.extend(over);
            Some(Value::Object(merged))
        }
        (_, Some(data)) => Some(data),
        (base, None) => base.cloned(),
    };

    request.set_header("User-Agent", user_agent);
    for (name, value) in defaults.headers.iter().chain(call.headers.iter()) {
        request.set_header(name, value);
    }
    request.set_header("Authorization", &format!("Bearer {token}"));
    request
}

fn substitute_path(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    url.split('/')
        .map(|segment| {
            segment
                .strip_prefix(':')
                .and_then(|name| params.iter().find(|(k, _)| k == name))
                .map(|(_, value)| urlencoding::encode(value).into_owned())
                .unwrap_or_else(|| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Authenticated client for the FeiShu Open Platform.
///
/// Every call resolves a token, sends one request and returns the envelope's
/// `data`. Nothing is retried: a failure surfaces to the caller as-is.
///
/// ```rust,no_run
/// use feishu_client::{ApiClient, ClientConfig, RequestOptions};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), feishu_core::FeishuError> {
/// let client = ApiClient::new(ClientConfig::new("cli_xxx", "secret_xxx"));
/// let chat: Value = client
///     .get("/im/v1/chats/:chat_id", RequestOptions::new().path_param("chat_id", "oc_xxx"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    config: Arc<ClientConfig>,
    tokens: TokenManager,
    transport: Arc<dyn HttpTransport>,
    logger: Arc<dyn Logger>,
    defaults: RequestOptions,
}

impl ApiClient {
    /// Client over the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.user_agent.clone()));
        Self::with_transport(config, transport)
    }

    /// Client over a caller-supplied transport, used for token fetches too.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        let logger = config
            .logger
            .clone()
            .unwrap_or_else(|| Arc::new(TracingLogger));
        Self {
            tokens: TokenManager::new(config.clone(), transport.clone()),
            config,
            transport,
            logger,
            defaults: RequestOptions::default(),
        }
    }

    /// Options merged under every call's own options.
    pub fn with_defaults(mut self, defaults: RequestOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// `{endpoint}/open-apis{path}`.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}/open-apis{path}", self.config.endpoint)
        } else {
            format!("{}/open-apis/{path}", self.config.endpoint)
        }
    }

    /// Send one authenticated request and return the envelope's `data`.
    ///
    /// # Errors
    ///
    /// - [`FeishuError::TokenFetch`] / [`FeishuError::AuthorizationCodeRequired`]
    ///   when no token is available.
    /// - [`FeishuError::Transport`] for network failures and non-2xx statuses.
    /// - [`FeishuError::Api`] when the envelope's `code` is not zero, even
    ///   under HTTP 200.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        let token = if options.user_access {
            self.tokens.get_user_access_token(None, None).await?
        } else {
            self.tokens.get_tenant_access_token().await?
        };

        let request = format_payload(
            &self.defaults,
            method,
            &self.api_url(path),
            options,
            &token,
            &self.config.user_agent,
        );
        let method = request.method.to_string();
        let url = request.full_url();
        self.logger.debug(&format!("{method} {url}"));

        let result = match self.transport.request(request).await {
            Ok(body) => unwrap_envelope(body),
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            let mut context = e.log_context();
            if let Value::Object(map) = &mut context {
                map.entry("url").or_insert_with(|| json!(url));
                map.entry("method").or_insert_with(|| json!(method));
            }
            self.logger.log(
                LogLevel::Error,
                &format!("{method} {url} failed: {e}"),
                Some(&context),
            );
            e
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        self.request(Method::GET, path, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        self.request(Method::POST, path, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        self.request(Method::PUT, path, options).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        self.request(Method::PATCH, path, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, FeishuError> {
        self.request(Method::DELETE, path, options).await
    }

    /// One page of a list endpoint.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ListPage<T>, FeishuError> {
        self.request(Method::GET, path, options).await
    }

    /// Every item of a list endpoint, following `page_token` until
    /// `has_more` is false.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Vec<T>, FeishuError> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut page_token: Option<String> = None;
        loop {
            let opts = options.clone().query_opt("page_token", page_token.as_deref());
            let page: ListPage<T> = self.get_list(path, opts).await?;
            let next = page.next_page_token().map(String::from);
            items.extend(page.items);
            match next {
                Some(token) if seen.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    self.logger.warn(&format!(
                        "{path}: page token {token} was already served, stopping pagination"
                    ));
                    break;
                }
                None => break,
            }
        }
        Ok(items)
    }
}
