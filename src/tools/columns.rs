//! Column tools.

use super::{
    ToolContext, get_order, make_tool, require_id, require_id_array, require_order, require_string,
};
use crate::db::Database;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "add_column",
            "Add a column at the right end of a board.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                },
                "name": {
                    "type": "string",
                    "description": "Column name"
                }
            }),
            vec!["board", "name"],
        ),
        make_tool(
            "list_columns",
            "List a board's columns in display order.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                }
            }),
            vec!["board"],
        ),
        make_tool(
            "rename_column",
            "Rename a column. Its position does not change.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                },
                "name": {
                    "type": "string",
                    "description": "New name"
                }
            }),
            vec!["column", "name"],
        ),
        make_tool(
            "move_column",
            "Move a column to a zero-based position on its board. Columns in between shift by one.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                },
                "order": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Target position, 0 to column count - 1"
                },
                "from_order": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Position the client last saw (informational)"
                }
            }),
            vec!["column", "order"],
        ),
        make_tool(
            "reorder_columns",
            "Set the full left-to-right order of a board's columns. Must list every column exactly once.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                },
                "column_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Every column ID of the board, in the desired order"
                }
            }),
            vec!["board", "column_ids"],
        ),
        make_tool(
            "delete_column",
            "Delete a column. Its tasks move to the end of the board's first remaining column. The last column cannot be deleted.",
            json!({
                "column": {
                    "type": "integer",
                    "description": "Column ID"
                }
            }),
            vec!["column"],
        ),
    ]
}

pub fn add_column(db: &Database, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    let name = require_string(&args, "name")?;

    let column = db.add_column(board_id, &name)?;
    Ok(serde_json::to_value(column)?)
}

pub fn list_columns(db: &Database, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    let columns = db.list_columns(board_id)?;
    Ok(json!({ "board_id": board_id, "columns": columns }))
}

pub fn rename_column(db: &Database, args: Value) -> Result<Value> {
    let column_id = require_id(&args, "column")?;
    let name = require_string(&args, "name")?;

    let column = db.rename_column(column_id, &name)?;
    Ok(serde_json::to_value(column)?)
}

pub fn move_column(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let column_id = require_id(&args, "column")?;
    let to_order = require_order(&args, "order")?;
    let from_order = get_order(&args, "from_order")?;

    let outcome = db.move_column(column_id, to_order, from_order)?;
    if !outcome.is_noop() {
        ctx.logger.info_with("Moved column", serde_json::to_value(outcome)?);
    }
    let columns = db.list_columns(outcome.to_parent)?;

    Ok(json!({
        "move": outcome,
        "columns": columns
    }))
}

pub fn reorder_columns(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    let ids = require_id_array(&args, "column_ids")?;

    let columns = db.reorder_columns(board_id, &ids)?;
    ctx.logger.info_with(
        "Reordered columns",
        json!({ "board_id": board_id, "column_ids": ids }),
    );
    Ok(json!({ "board_id": board_id, "columns": columns }))
}

pub fn delete_column(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let column_id = require_id(&args, "column")?;
    let column = db.get_column(column_id)?;

    db.delete_column(column_id)?;
    ctx.logger.info(&format!("Deleted column {}", column_id));

    let columns = db.list_columns(column.board_id)?;
    Ok(json!({
        "deleted": true,
        "column_id": column_id,
        "columns": columns
    }))
}
