//! feishu-mcp: a token-managed FeiShu/Lark Open Platform client and the MCP
//! tool adapter built on it.
//!
//! This crate re-exports the workspace crates for single-import usage.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `tools` |
//! | `tools` | Resource tools, [`ToolRegistry`](tools::ToolRegistry) and [`FeishuMcp`] |
//! | `subscriber` | [`init_tracing`]: stderr `tracing` output for binaries |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use feishu_mcp::client::ClientConfig;
//! use feishu_mcp::core::{LogLevel, TransportMode};
//! use feishu_mcp::FeishuMcp;
//!
//! let config = ClientConfig::new("cli_xxx", "secret_xxx");
//! let mut server = FeishuMcp::new(config, TransportMode::Stdio, LogLevel::Info);
//! let tools = server.registry().list_tools();
//! let notifications = server.take_notifications();
//! ```

/// Core traits and types: FeishuError, Cache, Logger, Tool.
pub use feishu_core as core;

/// In-memory token cache.
pub use feishu_cache as cache;

/// TokenManager, ApiClient and the HTTP transport seam.
pub use feishu_client as client;

/// Per-resource APIs, tools and the tool registry.
#[cfg(feature = "tools")]
pub use feishu_tools as tools;

#[cfg(feature = "tools")]
mod server;
#[cfg(feature = "tools")]
pub use server::FeishuMcp;

#[cfg(feature = "subscriber")]
mod subscriber;
#[cfg(feature = "subscriber")]
pub use subscriber::init_tracing;

pub use feishu_client::{ApiClient, ClientConfig};
pub use feishu_core::{FeishuError, LogLevel, TransportMode};
