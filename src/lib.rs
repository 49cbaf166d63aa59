//! Kanban Order MCP Server Library
//!
//! Boards, columns and tasks whose positions are kept dense (`0..n-1`) by the
//! [`reorder`] module. Exported for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod reorder;
pub mod tools;
pub mod types;
