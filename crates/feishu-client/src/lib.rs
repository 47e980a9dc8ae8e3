//! Token-managed authenticated HTTP client for the FeiShu (Lark) Open Platform.
//!
//! - [`TokenManager`]: tenant and user access tokens, cached with a 180 s
//!   early-expiry margin
//! - [`ApiClient`]: bearer injection, query encoding, envelope checking and
//!   error normalization over a pluggable [`HttpTransport`]
//!
//! # Quick start
//!
//! ```rust,no_run
//! use feishu_client::{ApiClient, ClientConfig, RequestOptions};
//! use serde_json::Value;
//!
//! # async fn example() -> Result<(), feishu_core::FeishuError> {
//! let client = ApiClient::new(ClientConfig::new("cli_xxx", "app_secret_xxx"));
//! let page = client
//!     .get_list::<Value>("/im/v1/chats", RequestOptions::new().query("page_size", 20))
//!     .await?;
//! println!("{} chats", page.items.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod query;
mod response;
mod transport;

pub use auth::{
    cache_expiry, AccessToken, TokenManager, EXPIRY_MARGIN, REFRESH_TOKEN_KEY,
    REFRESH_TOKEN_LIFETIME, TENANT_TOKEN_KEY, USER_TOKEN_KEY,
};
pub use client::{format_payload, ApiClient, RequestOptions};
pub use config::{mask, ClientConfig, Credentials, DEFAULT_ENDPOINT, USER_AGENT};
pub use query::QueryParams;
pub use response::{unwrap_envelope, ApiResponse, ListPage};
pub use transport::{
    EnvelopeInterceptor, HttpRequest, HttpTransport, Interceptor, ReqwestTransport,
    UserAgentInterceptor,
};

pub use reqwest::Method;

// Re-export core types for convenience
pub use feishu_core::{FeishuError, TokenKind, TransportError};
