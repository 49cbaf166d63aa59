//! Board column operations.

use super::{Database, SqliteSiblings, now_ms, validate_name};
use crate::error::{OrderError, OrderResult};
use crate::reorder::{self, SiblingStore};
use crate::types::{BoardColumn, Id, MoveOutcome, Order, OrderedIds};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

pub fn parse_column_row(row: &Row) -> rusqlite::Result<BoardColumn> {
    Ok(BoardColumn {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        name: row.get("name")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a column using an existing connection (avoids deadlock).
pub(crate) fn get_column_internal(conn: &Connection, column_id: Id) -> OrderResult<BoardColumn> {
    conn.query_row(
        "SELECT * FROM board_columns WHERE id = ?1",
        params![column_id],
        parse_column_row,
    )
    .optional()?
    .ok_or_else(|| OrderError::not_found("column", column_id))
}

/// Internal helper to list a board's columns by order.
pub(crate) fn list_columns_internal(conn: &Connection, board_id: Id) -> OrderResult<Vec<BoardColumn>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM board_columns WHERE board_id = ?1 ORDER BY sort_order, id",
    )?;
    let columns = stmt
        .query_map(params![board_id], parse_column_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Append a column to a board inside an open transaction.
pub(crate) fn append_column(conn: &Connection, board_id: Id, name: &str) -> OrderResult<BoardColumn> {
    let order = reorder::next_order(&SqliteSiblings::columns(conn), board_id)?;
    let now = now_ms();

    conn.execute(
        "INSERT INTO board_columns (board_id, name, sort_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![board_id, name, order, now, now],
    )?;

    Ok(BoardColumn {
        id: conn.last_insert_rowid(),
        board_id,
        name: name.to_string(),
        order,
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    /// Add a column at the end of a board.
    pub fn add_column(&self, board_id: Id, name: &str) -> OrderResult<BoardColumn> {
        let name = validate_name("name", name)?;
        let column = self.with_ordered_tx(|tx| append_column(tx, board_id, &name))?;
        info!(board_id, column_id = column.id, order = column.order, "Added column");
        Ok(column)
    }

    /// Get a column by ID.
    pub fn get_column(&self, column_id: Id) -> OrderResult<BoardColumn> {
        self.with_conn(|conn| get_column_internal(conn, column_id))
    }

    /// List a board's columns sorted by order.
    pub fn list_columns(&self, board_id: Id) -> OrderResult<Vec<BoardColumn>> {
        self.with_conn(|conn| {
            if !SqliteSiblings::columns(conn).parent_exists(board_id)? {
                return Err(OrderError::not_found("board", board_id));
            }
            list_columns_internal(conn, board_id)
        })
    }

    /// Rename a column. Its position is untouched.
    pub fn rename_column(&self, column_id: Id, name: &str) -> OrderResult<BoardColumn> {
        let name = validate_name("name", name)?;
        self.with_ordered_tx(|tx| {
            let updated = tx.execute(
                "UPDATE board_columns SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now_ms(), column_id],
            )?;
            if updated == 0 {
                return Err(OrderError::not_found("column", column_id));
            }
            get_column_internal(tx, column_id)
        })
    }

    /// Move a column to `to_order` within its board.
    pub fn move_column(
        &self,
        column_id: Id,
        to_order: Order,
        from_order: Option<Order>,
    ) -> OrderResult<MoveOutcome> {
        self.with_ordered_tx(|tx| {
            let column = get_column_internal(tx, column_id)?;
            reorder::move_within_list(
                &SqliteSiblings::columns(tx),
                column.board_id,
                column_id,
                from_order,
                to_order,
            )
        })
    }

    /// Replace the order of a board's columns with the order of `ids`.
    pub fn reorder_columns(&self, board_id: Id, ids: &OrderedIds) -> OrderResult<Vec<BoardColumn>> {
        self.with_ordered_tx(|tx| {
            let rewritten = reorder::reorder_explicit(&SqliteSiblings::columns(tx), board_id, ids)?;
            debug!(board_id, rewritten, "Reordered columns");
            list_columns_internal(tx, board_id)
        })
    }

    /// Delete a column, relocating its tasks.
    ///
    /// The tasks are appended, in their current order, to the first remaining
    /// column of the board. A board's last column cannot be deleted.
    pub fn delete_column(&self, column_id: Id) -> OrderResult<()> {
        self.with_ordered_tx(|tx| {
            let column = get_column_internal(tx, column_id)?;
            let columns = SqliteSiblings::columns(tx);
            let tasks = SqliteSiblings::tasks(tx);

            let Some(destination) = columns
                .read_siblings(column.board_id)?
                .into_iter()
                .find(|sibling| sibling.id != column_id)
            else {
                return Err(OrderError::validation("Cannot delete the last column of a board"));
            };

            let moving = tasks.read_siblings(column_id)?;
            reorder::resequence(&tasks, destination.id)?;
            let mut next = reorder::plan::next_order(&tasks.read_siblings(destination.id)?);
            for task in &moving {
                tasks.reparent_and_order(task.id, column_id, destination.id, next)?;
                next += 1;
            }

            reorder::delete_item(&columns, column_id)?;

            info!(
                column_id,
                board_id = column.board_id,
                destination = destination.id,
                relocated = moving.len(),
                "Deleted column"
            );
            Ok(())
        })
    }
}
