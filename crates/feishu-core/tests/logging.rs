use std::sync::Arc;

use feishu_core::{
    LevelFilterLogger, LogLevel, Logger, LoggingSink, RecordingLogger, TransportMode,
};
use serde_json::json;

#[test]
fn level_filter_drops_less_severe_records() {
    let recorder = RecordingLogger::new();
    let logger = LevelFilterLogger::new(Arc::new(recorder.clone()), LogLevel::Warn);

    logger.error("boom");
    logger.warn("careful");
    logger.info("hello");
    logger.debug("details");
    logger.trace("noise");

    let levels: Vec<LogLevel> = recorder.records().iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![LogLevel::Error, LogLevel::Warn]);
}

#[test]
fn level_filter_at_trace_passes_everything() {
    let recorder = RecordingLogger::new();
    let logger = LevelFilterLogger::new(Arc::new(recorder.clone()), LogLevel::Trace);
    logger.trace("noise");
    logger.log(LogLevel::Debug, "with context", Some(&json!({ "url": "/x" })));

    let records = recorder.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].context.as_ref().unwrap()["url"], "/x");
}

#[tokio::test]
async fn stdio_sink_queues_records_for_notifications() {
    let (sink, rx) = LoggingSink::for_transport(TransportMode::Stdio);
    let mut rx = rx.expect("stdio mode returns a receiver");
    assert!(matches!(sink, LoggingSink::Notifications(_)));

    sink.warn("token cache unavailable");

    let record = rx.recv().await.unwrap();
    assert_eq!(record.level, LogLevel::Warn);
    assert_eq!(record.message, "token cache unavailable");
}

#[test]
fn http_sink_uses_tracing() {
    let (sink, rx) = LoggingSink::for_transport(TransportMode::Http);
    assert!(rx.is_none());
    assert!(matches!(sink, LoggingSink::Tracing(_)));
    // No subscriber installed: must not panic.
    sink.info("started");
}

#[test]
fn stdio_sink_tolerates_dropped_receiver() {
    let (sink, rx) = LoggingSink::for_transport(TransportMode::Stdio);
    drop(rx);
    sink.error("nobody listening");
}
