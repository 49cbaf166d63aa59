//! Board operations and the assembled board view.

use super::columns::{append_column, list_columns_internal};
use super::tasks::parse_task_row;
use super::{Database, now_ms, validate_name};
use crate::error::{OrderError, OrderResult};
use crate::types::{Board, BoardView, ColumnView, Id, Task};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use tracing::info;

pub fn parse_board_row(row: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn get_board_internal(conn: &Connection, board_id: Id) -> OrderResult<Board> {
    conn.query_row(
        "SELECT * FROM boards WHERE id = ?1",
        params![board_id],
        parse_board_row,
    )
    .optional()?
    .ok_or_else(|| OrderError::not_found("board", board_id))
}

/// Build a board view: columns by order, each with its tasks by order.
fn get_board_view_internal(conn: &Connection, board_id: Id) -> OrderResult<BoardView> {
    let board = get_board_internal(conn, board_id)?;
    let columns = list_columns_internal(conn, board_id)?;

    let mut stmt = conn.prepare_cached(
        "SELECT t.* FROM tasks t
         INNER JOIN board_columns c ON c.id = t.column_id
         WHERE c.board_id = ?1
         ORDER BY t.column_id, t.sort_order, t.id",
    )?;
    let mut by_column: HashMap<Id, Vec<Task>> = HashMap::new();
    for task in stmt.query_map(params![board_id], parse_task_row)? {
        let task = task?;
        by_column.entry(task.column_id).or_default().push(task);
    }

    let columns = columns
        .into_iter()
        .map(|column| ColumnView {
            tasks: by_column.remove(&column.id).unwrap_or_default(),
            column,
        })
        .collect();

    Ok(BoardView { board, columns })
}

impl Database {
    /// Create a board together with the configured default columns.
    pub fn create_board(&self, name: &str, description: Option<String>) -> OrderResult<BoardView> {
        let name = validate_name("name", name)?;
        let default_columns = &self.boards_config().default_columns;

        let view = self.with_ordered_tx(|tx| {
            let now = now_ms();
            tx.execute(
                "INSERT INTO boards (name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, description, now, now],
            )?;
            let board_id = tx.last_insert_rowid();

            for column_name in default_columns {
                append_column(tx, board_id, &validate_name("column name", column_name)?)?;
            }

            get_board_view_internal(tx, board_id)
        })?;

        info!(
            board_id = view.board.id,
            columns = view.columns.len(),
            "Created board"
        );
        Ok(view)
    }

    /// Get a board with its columns and tasks in display order.
    pub fn get_board(&self, board_id: Id) -> OrderResult<BoardView> {
        self.with_conn(|conn| get_board_view_internal(conn, board_id))
    }

    /// List all boards.
    pub fn list_boards(&self) -> OrderResult<Vec<Board>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM boards ORDER BY id")?;
            let boards = stmt
                .query_map([], parse_board_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(boards)
        })
    }

    /// Update a board's name and/or description.
    pub fn update_board(
        &self,
        board_id: Id,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> OrderResult<Board> {
        let name = name.map(|n| validate_name("name", &n)).transpose()?;

        self.with_ordered_tx(|tx| {
            let board = get_board_internal(tx, board_id)?;
            let new_name = name.clone().unwrap_or(board.name.clone());
            let new_description = description.clone().unwrap_or(board.description.clone());

            tx.execute(
                "UPDATE boards SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![new_name, new_description, now_ms(), board_id],
            )?;

            get_board_internal(tx, board_id)
        })
    }

    /// Delete a board with all of its columns and tasks.
    pub fn delete_board(&self, board_id: Id) -> OrderResult<()> {
        self.with_ordered_tx(|tx| {
            let deleted = tx.execute("DELETE FROM boards WHERE id = ?1", params![board_id])?;
            if deleted == 0 {
                return Err(OrderError::not_found("board", board_id));
            }
            Ok(())
        })?;
        info!(board_id, "Deleted board");
        Ok(())
    }
}
