//! Per-request context passed to tool functions.

use crate::logging::Logger;

/// Per-request context passed to all tools.
#[derive(Clone)]
pub struct ToolContext {
    /// Logger named after the tool being called.
    pub logger: Logger,
}

impl ToolContext {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Context with a peerless logger, for calls made outside an MCP session.
    pub fn detached(tool_name: &str) -> Self {
        Self::new(Logger::new(format!("tool:{}", tool_name)))
    }
}
