use feishu_core::{FeishuError, LogLevel};
use tracing::Level;

/// Install a global `tracing` subscriber that writes to stderr, keeping stdout
/// free for protocol frames.
///
/// # Errors
///
/// [`FeishuError::Config`] if a global subscriber is already installed.
pub fn init_tracing(level: LogLevel) -> Result<(), FeishuError> {
    let level = match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .try_init()
        .map_err(|e| FeishuError::Config(format!("installing tracing subscriber: {e}")))
}
