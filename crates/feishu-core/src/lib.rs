//! Core traits and types shared by the feishu-mcp crates.
//!
//! - [`FeishuError`]: the single error type used across the workspace
//! - [`Cache`]: async key/value capability consumed by the token manager
//! - [`Logger`]: leveled log sink, with [`LevelFilterLogger`] and [`LoggingSink`]
//! - [`Tool`]: an operation an external agent can invoke through MCP

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which kind of bearer credential a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Tenant,
    User,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Tenant => f.write_str("tenant"),
            TokenKind::User => f.write_str("user"),
        }
    }
}

/// A transport-level failure normalized into one shape, independent of the
/// HTTP library underneath.
///
/// Serializes with camelCase keys so it can be attached to log records as-is.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{method} {url}: {message}")]
pub struct TransportError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    pub url: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TransportError {
    pub fn new(
        message: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            status: None,
            status_text: None,
            url: url.into(),
            method: method.into(),
            data: None,
        }
    }

    pub fn with_status(mut self, status: u16, status_text: Option<String>) -> Self {
        self.status = Some(status);
        self.status_text = status_text;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The error as a JSON object, for structured log context.
    pub fn context(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeishuError {
    #[error("transport error: {0}")]
    Transport(TransportError),
    #[error("invalid response format: {0}")]
    InvalidResponseFormat(String),
    #[error("api error: code={code}, msg={msg}")]
    Api { code: i64, msg: String },
    #[error("missing fields in response: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("authorization code required; authorize at {url}")]
    AuthorizationCodeRequired { url: String },
    #[error("redirect URI required to build the authorization URL")]
    RedirectUriRequired,
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
    #[error("Failed to fetch {kind} access token")]
    TokenFetch {
        kind: TokenKind,
        #[source]
        source: Box<FeishuError>,
    },
    #[error("cache error: {0}")]
    Cache(String),
    #[error("tool error: {0}")]
    Tool(String),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("parsing error: {0}")]
    Parsing(String),
}

impl FeishuError {
    /// The application-level `code` of an [`FeishuError::Api`] failure.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            FeishuError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Structured context for logging: the normalized transport shape when
    /// available, otherwise just the message.
    pub fn log_context(&self) -> Value {
        match self {
            FeishuError::Transport(e) => e.context(),
            FeishuError::Api { code, msg } => serde_json::json!({ "code": code, "msg": msg }),
            FeishuError::TokenFetch { source, .. } => source.log_context(),
            other => serde_json::json!({ "message": other.to_string() }),
        }
    }
}

impl From<TransportError> for FeishuError {
    fn from(e: TransportError) -> Self {
        FeishuError::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Cache capability
// ---------------------------------------------------------------------------

/// Compose the storage key for `key` inside `namespace`.
pub fn namespaced_key(key: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{key}"),
        None => key.to_string(),
    }
}

/// Async key/value store with optional per-entry expiry.
///
/// Entries without `expires_at` never expire.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str, namespace: Option<&str>) -> Result<Option<Value>, FeishuError>;

    async fn set(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<SystemTime>,
        namespace: Option<&str>,
    ) -> Result<bool, FeishuError>;
}

// ---------------------------------------------------------------------------
// Logger capability
// ---------------------------------------------------------------------------

/// Log severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = FeishuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(FeishuError::Config(format!("unknown log level '{other}'"))),
        }
    }
}

/// A leveled log sink.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>);

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, None);
    }
}

/// Emits every record as a `tracing` event at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        let context = context.map(Value::to_string).unwrap_or_default();
        match level {
            LogLevel::Error => tracing::error!(context = %context, "{message}"),
            LogLevel::Warn => tracing::warn!(context = %context, "{message}"),
            LogLevel::Info => tracing::info!(context = %context, "{message}"),
            LogLevel::Debug => tracing::debug!(context = %context, "{message}"),
            LogLevel::Trace => tracing::trace!(context = %context, "{message}"),
        }
    }
}

/// Drops records less severe than `max_level` before they reach `inner`.
#[derive(Clone)]
pub struct LevelFilterLogger {
    inner: Arc<dyn Logger>,
    max_level: LogLevel,
}

impl LevelFilterLogger {
    pub fn new(inner: Arc<dyn Logger>, max_level: LogLevel) -> Self {
        Self { inner, max_level }
    }

    pub fn max_level(&self) -> LogLevel {
        self.max_level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.max_level
    }
}

impl Logger for LevelFilterLogger {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        if self.enabled(level) {
            self.inner.log(level, message, context);
        }
    }
}

/// One log record, as forwarded to an MCP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// How the MCP adapter talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Stdout carries protocol frames; logs must not be written there.
    Stdio,
    Http,
}

/// Log destination chosen once per transport mode.
#[derive(Debug, Clone)]
pub enum LoggingSink {
    Tracing(TracingLogger),
    /// Records are queued for the adapter to emit as `notifications/message`.
    Notifications(mpsc::UnboundedSender<LogRecord>),
}

impl LoggingSink {
    /// Select the sink for `mode`. In stdio mode the receiving half of the
    /// notification queue is returned alongside the sink.
    pub fn for_transport(mode: TransportMode) -> (Self, Option<mpsc::UnboundedReceiver<LogRecord>>) {
        match mode {
            TransportMode::Http => (LoggingSink::Tracing(TracingLogger), None),
            TransportMode::Stdio => {
                let (tx, rx) = mpsc::unbounded_channel();
                (LoggingSink::Notifications(tx), Some(rx))
            }
        }
    }
}

impl Logger for LoggingSink {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        match self {
            LoggingSink::Tracing(inner) => inner.log(level, message, context),
            LoggingSink::Notifications(tx) => {
                // A closed queue means the client went away; there is nowhere left to report.
                let _ = tx.send(LogRecord {
                    level,
                    message: message.to_string(),
                    context: context.cloned(),
                });
            }
        }
    }
}

/// A logger that keeps every record in memory, useful for testing.
#[derive(Default, Clone)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Records at exactly `level`.
    pub fn at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(LogRecord {
                level,
                message: message.to_string(),
                context: context.cloned(),
            });
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A tool as advertised to an MCP client in `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// An operation an agent can call: a name, a description, a JSON schema for
/// its arguments and an async `call()`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    fn parameters(&self) -> Option<Value> {
        None
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError>;

    fn as_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self
                .parameters()
                .unwrap_or(serde_json::json!({"type": "object", "properties": {}})),
        }
    }
}
