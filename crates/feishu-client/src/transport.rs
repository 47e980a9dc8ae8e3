use std::sync::Arc;

use async_trait::async_trait;
use feishu_core::{FeishuError, TransportError};
use reqwest::Method;
use serde_json::Value;

use crate::query::QueryParams;

/// A fully-resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: QueryParams,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: QueryParams::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any existing value under any casing.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// URL including the encoded query string.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query.to_query_string())
        }
    }
}

/// The minimal capability the client needs from an HTTP backend: send a
/// request and hand back the parsed JSON body.
///
/// Implement this to swap in another HTTP library or a fake in tests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<Value, FeishuError>;
}

/// Hook run around every request of a [`ReqwestTransport`].
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut HttpRequest) -> Result<(), FeishuError> {
        Ok(())
    }

    fn on_response(&self, _request: &HttpRequest, body: Value) -> Result<Value, FeishuError> {
        Ok(body)
    }
}

/// Adds a `User-Agent` header unless the request already carries one.
pub struct UserAgentInterceptor {
    user_agent: String,
}

impl UserAgentInterceptor {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Interceptor for UserAgentInterceptor {
    fn on_request(&self, request: &mut HttpRequest) -> Result<(), FeishuError> {
        if request.header("user-agent").is_none() {
            request.set_header("User-Agent", &self.user_agent);
        }
        Ok(())
    }
}

/// Turns a body with a non-zero `code` into [`FeishuError::Api`].
pub struct EnvelopeInterceptor;

impl Interceptor for EnvelopeInterceptor {
    fn on_response(&self, _request: &HttpRequest, body: Value) -> Result<Value, FeishuError> {
        if let Some(code) = body.get("code").and_then(Value::as_i64) {
            if code != 0 {
                return Err(FeishuError::Api {
                    code,
                    msg: body["msg"].as_str().unwrap_or("unknown").to_string(),
                });
            }
        }
        Ok(body)
    }
}

/// Default transport on top of `reqwest`, with an interceptor chain.
pub struct ReqwestTransport {
    client: reqwest::Client,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ReqwestTransport {
    /// Transport with the standard chain: user agent, then envelope check.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), user_agent)
    }

    pub fn with_client(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            interceptors: vec![
                Arc::new(UserAgentInterceptor::new(user_agent)),
                Arc::new(EnvelopeInterceptor),
            ],
        }
    }

    /// Transport with no interceptors at all.
    pub fn bare(client: reqwest::Client) -> Self {
        Self {
            client,
            interceptors: Vec::new(),
        }
    }

    /// Append an interceptor; it runs after the ones already installed.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, mut request: HttpRequest) -> Result<Value, FeishuError> {
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request)?;
        }

        let method = request.method.to_string();
        let url = request.full_url();

        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string(), &method, &url))?;
        let status = resp.status();
        let status_text = status.canonical_reason().map(String::from);
        let text = resp.text().await.map_err(|e| {
            TransportError::new(format!("reading body: {e}"), &method, &url)
                .with_status(status.as_u16(), status_text.clone())
        })?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(TransportError::new(
                format!("request failed with status {}", status.as_u16()),
                &method,
                &url,
            )
            .with_status(status.as_u16(), status_text)
            .with_data(parsed.unwrap_or(Value::String(text)))
            .into());
        }

        let Some(mut body) = parsed else {
            return Err(TransportError::new("response body is not valid JSON", &method, &url)
                .with_status(status.as_u16(), status_text)
                .with_data(Value::String(text))
                .into());
        };

        for interceptor in &self.interceptors {
            body = interceptor.on_response(&request, body)?;
        }
        Ok(body)
    }
}
