use std::sync::Arc;

use feishu_client::{ApiClient, ClientConfig};
use feishu_core::{LevelFilterLogger, LogLevel, LogRecord, LoggingSink, TransportMode};
use feishu_tools::ToolRegistry;
use tokio::sync::mpsc::UnboundedReceiver;

/// A client, its tools and the log sink for one MCP transport, wired
/// together.
///
/// In stdio mode stdout carries protocol frames, so log records are queued
/// for the caller to forward as `notifications/message`; in HTTP mode they go
/// to `tracing`. A logger already set on the config is replaced.
pub struct FeishuMcp {
    client: Arc<ApiClient>,
    registry: ToolRegistry,
    notifications: Option<UnboundedReceiver<LogRecord>>,
}

impl FeishuMcp {
    /// Records less severe than `level` are dropped.
    pub fn new(config: ClientConfig, mode: TransportMode, level: LogLevel) -> Self {
        let (sink, notifications) = LoggingSink::for_transport(mode);
        let logger = LevelFilterLogger::new(Arc::new(sink), level);
        let client = Arc::new(ApiClient::new(config.with_logger(Arc::new(logger))));
        tracing::debug!(?mode, level = level.as_str(), "feishu-mcp initialized");
        Self {
            registry: ToolRegistry::with_feishu_tools(client.clone()),
            client,
            notifications,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The queue of log records to forward to the MCP client. `Some` once,
    /// in stdio mode only.
    pub fn take_notifications(&mut self) -> Option<UnboundedReceiver<LogRecord>> {
        self.notifications.take()
    }
}
