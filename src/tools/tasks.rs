//! Task tools.

use super::{
    ToolContext, get_nullable_string, get_order, get_string, make_tool, require_id,
    require_id_array, require_string,
};
use crate::db::Database;
use crate::db::tasks::parse_due_date;
use crate::error::ToolError;
use anyhow::Result;
use chrono::NaiveDate;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "create_task",
            "Create a task at the bottom of a column.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                },
                "title": {
                    "type": "string",
                    "description": "Task title"
                },
                "description": {
                    "type": "string",
                    "description": "Task description"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date as YYYY-MM-DD"
                }
            }),
            vec!["column", "title"],
        ),
        make_tool(
            "get_task",
            "Get a single task by ID.",
            json!({
                "task": {
                    "type": "integer",
                    "description": "Task ID"
                }
            }),
            vec!["task"],
        ),
        make_tool(
            "list_tasks",
            "List tasks of one column in order, or of every column when no column is given.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                }
            }),
            vec![],
        ),
        make_tool(
            "update_task",
            "Change a task's title, description or due date. Pass null to clear description or due_date. Use move_task to change its position.",
            json!({
                "task": {
                    "type": "integer",
                    "description": "Task ID"
                },
                "title": {
                    "type": "string",
                    "description": "New title"
                },
                "description": {
                    "type": ["string", "null"],
                    "description": "New description"
                },
                "due_date": {
                    "type": ["string", "null"],
                    "description": "New due date as YYYY-MM-DD"
                }
            }),
            vec!["task"],
        ),
        make_tool(
            "move_task",
            "Move a task to a position in a column. Use its current column to reorder in place. Without order the task goes to the bottom. Within the same column order must be 0..n-1. In another column an order past the end appends (or is rejected when the server's target_index_policy is reject).",
            json!({
                "task": {
                    "type": "integer",
                    "description": "Task ID"
                },
                "column": {
                    "type": "integer",
                    "description": "Target column ID"
                },
                "order": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Zero-based target position"
                },
                "from_order": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Position the client last saw (informational)"
                }
            }),
            vec!["task", "column"],
        ),
        make_tool(
            "reorder_tasks",
            "Set the full top-to-bottom order of a column's tasks. Must list every task of the column exactly once.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                },
                "task_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Every task ID of the column, in the desired order"
                }
            }),
            vec!["column", "task_ids"],
        ),
        make_tool(
            "list_due_tasks",
            "List every task that has a due date, earliest first, with its column and board. Optional inclusive from/to bounds.",
            json!({
                "from": {
                    "type": "string",
                    "description": "Earliest due date as YYYY-MM-DD"
                },
                "to": {
                    "type": "string",
                    "description": "Latest due date as YYYY-MM-DD"
                }
            }),
            vec![],
        ),
        make_tool(
            "delete_task",
            "Delete a task. Tasks below it move up.",
            json!({
                "task": {
                    "type": "integer",
                    "description": "Task ID"
                }
            }),
            vec!["task"],
        ),
    ]
}

fn date_arg(field: &str, value: &str) -> Result<NaiveDate, ToolError> {
    parse_due_date(value).map_err(|e| ToolError::invalid_value(field, &e.to_string()))
}

fn due_date_arg(value: &str) -> Result<NaiveDate, ToolError> {
    date_arg("due_date", value)
}

pub fn create_task(db: &Database, args: Value) -> Result<Value> {
    let column_id = require_id(&args, "column")?;
    let title = require_string(&args, "title")?;
    let description = get_string(&args, "description")?;
    let due_date = get_string(&args, "due_date")?
        .map(|s| due_date_arg(&s))
        .transpose()?;

    let task = db.create_task(column_id, &title, description, due_date)?;
    Ok(serde_json::to_value(task)?)
}

pub fn get_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_id(&args, "task")?;
    let task = db.get_task(task_id)?;
    Ok(serde_json::to_value(task)?)
}

pub fn list_tasks(db: &Database, args: Value) -> Result<Value> {
    let column_id = match args.get("column") {
        None | Some(Value::Null) => None,
        Some(_) => Some(require_id(&args, "column")?),
    };
    let tasks = db.list_tasks(column_id)?;
    Ok(json!({ "tasks": tasks }))
}

pub fn update_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_id(&args, "task")?;
    let title = get_string(&args, "title")?;
    let description = get_nullable_string(&args, "description")?;
    let due_date = get_nullable_string(&args, "due_date")?
        .map(|value| value.map(|s| due_date_arg(&s)).transpose())
        .transpose()?;

    let task = db.update_task(task_id, title, description, due_date)?;
    Ok(serde_json::to_value(task)?)
}

pub fn move_task(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let task_id = require_id(&args, "task")?;
    let column_id = require_id(&args, "column")?;
    let order = get_order(&args, "order")?;
    let from_order = get_order(&args, "from_order")?;

    let (outcome, task) = db.move_task(task_id, column_id, order, from_order)?;
    if outcome.is_noop() {
        ctx.logger.debug(&format!("Task {} already at position {}", task_id, outcome.to_order));
    } else {
        ctx.logger.info_with("Moved task", serde_json::to_value(outcome)?);
    }

    Ok(json!({
        "move": outcome,
        "task": task
    }))
}

pub fn reorder_tasks(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let column_id = require_id(&args, "column")?;
    let ids = require_id_array(&args, "task_ids")?;

    let tasks = db.reorder_tasks(column_id, &ids)?;
    ctx.logger.info_with(
        "Reordered tasks",
        json!({ "column_id": column_id, "task_ids": ids }),
    );
    Ok(json!({ "column_id": column_id, "tasks": tasks }))
}

pub fn delete_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_id(&args, "task")?;
    db.delete_task(task_id)?;
    Ok(json!({ "deleted": true, "task_id": task_id }))
}

pub fn list_due_tasks(db: &Database, args: Value) -> Result<Value> {
    let from = get_string(&args, "from")?
        .map(|s| date_arg("from", &s))
        .transpose()?;
    let to = get_string(&args, "to")?
        .map(|s| date_arg("to", &s))
        .transpose()?;

    let tasks = db.list_due_tasks(from, to)?;
    Ok(json!({ "tasks": tasks }))
}
