use std::fmt;
use std::sync::Arc;

use feishu_core::{Cache, Logger};

/// Public-cloud FeiShu endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://open.feishu.cn";

/// Sent on every outbound request unless a caller overrides it.
pub const USER_AGENT: &str = concat!("feishu-mcp-server/", env!("CARGO_PKG_VERSION"));

/// Application identity. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// The secret reduced to its last four characters.
    pub fn masked_secret(&self) -> String {
        mask(&self.app_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.masked_secret())
            .finish()
    }
}

/// Mask everything but the last four characters of `value`.
pub fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(len - 4).collect();
    format!("****{tail}")
}

/// Configuration for an [`ApiClient`](crate::ApiClient).
///
/// Obtain `app_id` and `app_secret` from the FeiShu developer console.
#[derive(Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Base URL without the `/open-apis` suffix.
    pub endpoint: String,
    /// Token cache; an [`InMemoryCache`](feishu_cache::InMemoryCache) when unset.
    pub cache: Option<Arc<dyn Cache>>,
    /// Log sink; a [`TracingLogger`](feishu_core::TracingLogger) when unset.
    pub logger: Option<Arc<dyn Logger>>,
    /// Skip the token cache entirely, for reads and writes.
    pub disable_token_cache: bool,
    pub redirect_uri: Option<String>,
    pub authorization_code: Option<String>,
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a config targeting the FeiShu public cloud.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(app_id, app_secret),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache: None,
            logger: None,
            disable_token_cache: false,
            redirect_uri: None,
            authorization_code: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the endpoint (Lark international, private deployments, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_disable_token_cache(mut self, disable: bool) -> Self {
        self.disable_token_cache = disable;
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn app_id(&self) -> &str {
        self.credentials.app_id()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("cache", &self.cache.is_some())
            .field("logger", &self.logger.is_some())
            .field("disable_token_cache", &self.disable_token_cache)
            .field("redirect_uri", &self.redirect_uri)
            .field(
                "authorization_code",
                &self.authorization_code.as_deref().map(mask),
            )
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_masked_to_last_four() {
        let creds = Credentials::new("cli_a1", "supersecretvalue");
        assert_eq!(creds.masked_secret(), "****alue");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("supersecret"), "got: {debug}");
        assert!(debug.contains("cli_a1"));
    }

    #[test]
    fn short_secret_is_fully_masked() {
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask(""), "****");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("a", "b").with_endpoint("http://127.0.0.1:9000/");
        assert_eq!(config.endpoint, "http://127.0.0.1:9000");
        assert!(config.user_agent.starts_with("feishu-mcp-server/"));
    }
}
