//! MCP tool implementations.

pub mod boards;
pub mod columns;
pub mod context;
pub mod integrity;
pub mod tasks;

pub use context::ToolContext;

use crate::db::Database;
use crate::error::ToolError;
use crate::types::{Id, Order, OrderedIds};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::Value;
use std::sync::Arc;

/// Tool handler that processes MCP tool calls.
pub struct ToolHandler {
    pub db: Arc<Database>,
}

impl ToolHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        tools.extend(boards::get_tools());
        tools.extend(columns::get_tools());
        tools.extend(tasks::get_tools());
        tools.extend(integrity::get_tools());
        tools
    }

    /// Call a tool by name.
    pub fn call_tool(&self, name: &str, arguments: Value, ctx: &ToolContext) -> Result<Value> {
        let db = self.db.as_ref();
        match name {
            // Board tools
            "create_board" => boards::create_board(db, ctx, arguments),
            "list_boards" => boards::list_boards(db, arguments),
            "get_board" => boards::get_board(db, arguments),
            "update_board" => boards::update_board(db, arguments),
            "delete_board" => boards::delete_board(db, ctx, arguments),

            // Column tools
            "add_column" => columns::add_column(db, arguments),
            "list_columns" => columns::list_columns(db, arguments),
            "rename_column" => columns::rename_column(db, arguments),
            "move_column" => columns::move_column(db, ctx, arguments),
            "reorder_columns" => columns::reorder_columns(db, ctx, arguments),
            "delete_column" => columns::delete_column(db, ctx, arguments),

            // Task tools
            "create_task" => tasks::create_task(db, arguments),
            "get_task" => tasks::get_task(db, arguments),
            "list_tasks" => tasks::list_tasks(db, arguments),
            "update_task" => tasks::update_task(db, arguments),
            "move_task" => tasks::move_task(db, ctx, arguments),
            "reorder_tasks" => tasks::reorder_tasks(db, ctx, arguments),
            "delete_task" => tasks::delete_task(db, arguments),
            "list_due_tasks" => tasks::list_due_tasks(db, arguments),

            "check_integrity" => integrity::check_integrity(db, ctx, arguments),

            _ => Err(ToolError::unknown_tool(name).into()),
        }
    }
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    Tool::new(name.to_string(), description.to_string(), input_schema)
}

/// Helper to get an optional string; `null` counts as absent.
pub fn get_string(args: &Value, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ToolError::invalid_value(key, &format!("{} must be a string", key))),
    }
}

/// Helper to get a required, non-null string.
pub fn require_string(args: &Value, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::missing_field(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ToolError::invalid_value(key, &format!("{} must be a string", key))),
    }
}

/// Helper for clearable fields: absent leaves the value alone, `null` clears it.
pub fn get_nullable_string(args: &Value, key: &str) -> Result<Option<Option<String>>, ToolError> {
    match args.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
        Some(_) => Err(ToolError::invalid_value(key, &format!("{} must be a string or null", key))),
    }
}

/// Helper to get a required integer id.
pub fn require_id(args: &Value, key: &str) -> Result<Id, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::missing_field(key)),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| ToolError::invalid_value(key, &format!("{} must be an integer id", key))),
    }
}

/// Helper to get an optional zero-based position.
pub fn get_order(args: &Value, key: &str) -> Result<Option<Order>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| Order::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolError::invalid_value(key, &format!("{} must be a non-negative integer", key))
            }),
    }
}

/// Helper to get a required zero-based position.
pub fn require_order(args: &Value, key: &str) -> Result<Order, ToolError> {
    get_order(args, key)?.ok_or_else(|| ToolError::missing_field(key))
}

/// Helper to get a required array of ids in the caller's order.
pub fn require_id_array(args: &Value, key: &str) -> Result<OrderedIds, ToolError> {
    let items = match args.get(key) {
        None | Some(Value::Null) => return Err(ToolError::missing_field(key)),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ToolError::invalid_value(key, &format!("{} must be an array of ids", key)));
        }
    };

    let ids = items
        .iter()
        .map(|v| v.as_i64())
        .collect::<Option<Vec<Id>>>()
        .ok_or_else(|| ToolError::invalid_value(key, &format!("{} must contain only integer ids", key)))?;
    Ok(OrderedIds::new(ids))
}
