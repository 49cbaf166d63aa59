//! Error types for ordering operations and structured tool responses.

use crate::types::{Id, ListKind};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for ordering and resource operations.
pub type OrderResult<T> = std::result::Result<T, OrderError>;

/// Errors raised by the reconciler and the resource services.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Referenced item or parent does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Id },

    /// Request rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    /// Rows changed underneath the operation, or the database was locked.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lower-level storage failure.
    #[error("storage error: {0}")]
    Storage(rusqlite::Error),
}

impl OrderError {
    pub fn not_found(kind: &'static str, id: Id) -> Self {
        OrderError::NotFound { kind, id }
    }

    pub fn parent_not_found(kind: ListKind, id: Id) -> Self {
        OrderError::NotFound {
            kind: kind.parent_name(),
            id,
        }
    }

    pub fn item_not_found(kind: ListKind, id: Id) -> Self {
        OrderError::NotFound {
            kind: kind.item_name(),
            id,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OrderError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        OrderError::Conflict(message.into())
    }

    /// Whether retrying the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Conflict(_))
    }
}

impl From<rusqlite::Error> for OrderError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                OrderError::Conflict(err.to_string())
            }
            _ => OrderError::Storage(err),
        }
    }
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidFieldValue,
    ValidationFailed,

    // Not found errors
    BoardNotFound,
    ColumnNotFound,
    TaskNotFound,

    // Concurrency
    Conflict,

    // Internal errors
    DatabaseError,
    InternalError,
    UnknownTool,
}

/// Structured error for tool responses.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<OrderError> for ToolError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::NotFound { kind, .. } => {
                let code = match kind {
                    "board" => ErrorCode::BoardNotFound,
                    "column" => ErrorCode::ColumnNotFound,
                    _ => ErrorCode::TaskNotFound,
                };
                ToolError::new(code, message)
            }
            OrderError::Validation(_) => ToolError::new(ErrorCode::ValidationFailed, message),
            OrderError::Conflict(_) => ToolError::new(ErrorCode::Conflict, message)
                .with_details("Re-fetch the board and retry the request"),
            OrderError::Storage(_) => ToolError::new(ErrorCode::DatabaseError, message),
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ToolError>() {
            Ok(tool_err) => tool_err,
            Err(err) => match err.downcast::<OrderError>() {
                Ok(order_err) => order_err.into(),
                Err(err) => ToolError::internal(err),
            },
        }
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
