//! Board tools.

use super::{ToolContext, get_nullable_string, get_string, make_tool, require_id, require_string};
use crate::db::Database;
use crate::error::ToolError;
use crate::format::{OutputFormat, format_board_markdown, markdown_to_json};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "create_board",
            "Create a board. It starts with the configured default columns.",
            json!({
                "name": {
                    "type": "string",
                    "description": "Board name"
                },
                "description": {
                    "type": "string",
                    "description": "Board description"
                }
            }),
            vec!["name"],
        ),
        make_tool("list_boards", "List all boards.", json!({}), vec![]),
        make_tool(
            "get_board",
            "Get a board with its columns and their tasks, all in display order.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                },
                "format": {
                    "type": "string",
                    "enum": ["json", "markdown"],
                    "description": "Output format (default: json)"
                }
            }),
            vec!["board"],
        ),
        make_tool(
            "update_board",
            "Rename a board or change its description. Pass description: null to clear it.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                },
                "name": {
                    "type": "string",
                    "description": "New name"
                },
                "description": {
                    "type": ["string", "null"],
                    "description": "New description"
                }
            }),
            vec!["board"],
        ),
        make_tool(
            "delete_board",
            "Delete a board with all of its columns and tasks.",
            json!({
                "board": {
                    "type": "integer",
                    "description": "Board ID"
                }
            }),
            vec!["board"],
        ),
    ]
}

pub fn create_board(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let name = require_string(&args, "name")?;
    let description = get_string(&args, "description")?;

    let view = db.create_board(&name, description)?;
    ctx.logger.info_with(
        "Created board",
        json!({ "board_id": view.board.id, "columns": view.columns.len() }),
    );
    Ok(serde_json::to_value(view)?)
}

pub fn list_boards(db: &Database, _args: Value) -> Result<Value> {
    let boards = db.list_boards()?;
    Ok(json!({ "boards": boards }))
}

pub fn get_board(db: &Database, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    let format = match get_string(&args, "format")? {
        Some(name) => OutputFormat::from_str(&name).ok_or_else(|| {
            ToolError::invalid_value("format", "format must be 'json' or 'markdown'")
        })?,
        None => OutputFormat::default(),
    };

    let view = db.get_board(board_id)?;
    match format {
        OutputFormat::Markdown => Ok(markdown_to_json(format_board_markdown(&view))),
        OutputFormat::Json => Ok(serde_json::to_value(view)?),
    }
}

pub fn update_board(db: &Database, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    let name = get_string(&args, "name")?;
    let description = get_nullable_string(&args, "description")?;

    let board = db.update_board(board_id, name, description)?;
    Ok(serde_json::to_value(board)?)
}

pub fn delete_board(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let board_id = require_id(&args, "board")?;
    db.delete_board(board_id)?;
    ctx.logger.info(&format!("Deleted board {}", board_id));
    Ok(json!({ "deleted": true, "board_id": board_id }))
}
