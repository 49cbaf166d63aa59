//! Logging to tracing and to the connected MCP client.
//!
//! Levels use MCP's `LoggingLevel`. Every message goes to tracing; when a peer
//! is attached it is also sent as a `notifications/message` to the client.

use rmcp::{
    RoleServer,
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;

const LEVELS: [LoggingLevel; 8] = [
    LoggingLevel::Debug,
    LoggingLevel::Info,
    LoggingLevel::Notice,
    LoggingLevel::Warning,
    LoggingLevel::Error,
    LoggingLevel::Critical,
    LoggingLevel::Alert,
    LoggingLevel::Emergency,
];

fn severity(level: LoggingLevel) -> u8 {
    LEVELS
        .iter()
        .position(|l| *l == level)
        .map(|i| i as u8)
        .unwrap_or(0)
}

/// Minimum client-visible level, changed through `logging/setLevel`.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LoggingLevel) -> Self {
        Self(AtomicU8::new(severity(level)))
    }

    pub fn get(&self) -> LoggingLevel {
        LEVELS
            .get(self.0.load(Ordering::Relaxed) as usize)
            .copied()
            .unwrap_or(LoggingLevel::Debug)
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.store(severity(level), Ordering::Relaxed);
    }

    pub fn should_log(&self, level: LoggingLevel) -> bool {
        severity(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LoggingLevel::Info)
    }
}

/// Map an MCP level onto the nearest tracing level.
pub fn logging_level_to_tracing(level: LoggingLevel) -> Level {
    match level {
        LoggingLevel::Debug => Level::DEBUG,
        LoggingLevel::Info | LoggingLevel::Notice => Level::INFO,
        LoggingLevel::Warning => Level::WARN,
        LoggingLevel::Error
        | LoggingLevel::Critical
        | LoggingLevel::Alert
        | LoggingLevel::Emergency => Level::ERROR,
    }
}

/// Per-request logger.
#[derive(Clone)]
pub struct Logger {
    peer: Option<Peer<RoleServer>>,
    level_filter: Arc<LogLevelFilter>,
    name: String,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            peer: None,
            level_filter: Arc::new(LogLevelFilter::default()),
            name: name.into(),
        }
    }

    pub fn with_peer(mut self, peer: Peer<RoleServer>) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Log `message`, attaching `data` to the client notification when given.
    ///
    /// The level filter only gates the client notification; tracing has its
    /// own subscriber-level filter.
    pub fn log(&self, level: LoggingLevel, message: &str, data: Option<Value>) {
        let name = self.name.as_str();
        match logging_level_to_tracing(level) {
            Level::ERROR => tracing::error!(logger = %name, "{}", message),
            Level::WARN => tracing::warn!(logger = %name, "{}", message),
            Level::INFO => tracing::info!(logger = %name, "{}", message),
            Level::DEBUG => tracing::debug!(logger = %name, "{}", message),
            Level::TRACE => tracing::trace!(logger = %name, "{}", message),
        }

        if !self.level_filter.should_log(level) {
            return;
        }
        if let Some(peer) = self.peer.clone() {
            let data = match data {
                Some(Value::Object(mut fields)) => {
                    fields.insert("message".to_string(), json!(message));
                    Value::Object(fields)
                }
                Some(other) => json!({ "message": message, "data": other }),
                None => json!({ "message": message }),
            };
            let param = LoggingMessageNotificationParam {
                level,
                logger: Some(self.name.clone()),
                data,
            };
            tokio::spawn(async move {
                let _ = peer.notify_logging_message(param).await;
            });
        }
    }

    pub fn debug(&self, msg: &str) {
        self.log(LoggingLevel::Debug, msg, None);
    }

    pub fn info(&self, msg: &str) {
        self.log(LoggingLevel::Info, msg, None);
    }

    /// Info-level message with a structured payload, e.g. a move outcome.
    pub fn info_with(&self, msg: &str, data: Value) {
        self.log(LoggingLevel::Info, msg, Some(data));
    }

    pub fn warning(&self, msg: &str) {
        self.log(LoggingLevel::Warning, msg, None);
    }

    pub fn error(&self, msg: &str) {
        self.log(LoggingLevel::Error, msg, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let filter = LogLevelFilter::new(LoggingLevel::Warning);

        assert!(!filter.should_log(LoggingLevel::Debug));
        assert!(!filter.should_log(LoggingLevel::Notice));
        assert!(filter.should_log(LoggingLevel::Warning));
        assert!(filter.should_log(LoggingLevel::Emergency));

        filter.set(LoggingLevel::Debug);
        assert!(filter.should_log(LoggingLevel::Debug));
        assert_eq!(filter.get(), LoggingLevel::Debug);
    }

    #[test]
    fn test_default_filter_hides_debug() {
        let filter = LogLevelFilter::default();
        assert!(!filter.should_log(LoggingLevel::Debug));
        assert!(filter.should_log(LoggingLevel::Info));
    }

    #[test]
    fn test_level_roundtrip() {
        for level in LEVELS {
            assert_eq!(LogLevelFilter::new(level).get(), level);
        }
    }

    #[test]
    fn test_logging_level_to_tracing() {
        assert_eq!(logging_level_to_tracing(LoggingLevel::Notice), Level::INFO);
        assert_eq!(logging_level_to_tracing(LoggingLevel::Warning), Level::WARN);
        assert_eq!(logging_level_to_tracing(LoggingLevel::Alert), Level::ERROR);
    }

    #[test]
    fn test_logger_without_peer_only_traces() {
        let logger = Logger::new("tool:move_task");
        assert_eq!(logger.name(), "tool:move_task");
        logger.info_with("Moved task", json!({ "task_id": 1 }));
        logger.warning("Order hint was stale");
        logger.debug("Task 1 already at position 0");
        logger.error("Repair failed, nothing renumbered");
    }
}
