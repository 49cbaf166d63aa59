//! Task CRUD and positioning operations.

use super::{Database, SqliteSiblings, now_ms, validate_name};
use crate::error::{OrderError, OrderResult};
use crate::reorder::{self, SiblingStore};
use crate::types::{DueTask, Id, MoveOutcome, Order, OrderedIds, Task};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

/// Storage format of `due_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due_date(value: &str) -> OrderResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).map_err(|_| {
        OrderError::validation(format!("due_date must be YYYY-MM-DD, got '{}'", value))
    })
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let due_date: Option<String> = row.get("due_date")?;
    let due_date = due_date
        .map(|s| {
            NaiveDate::parse_from_str(&s, DUE_DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
            })
        })
        .transpose()?;

    Ok(Task {
        id: row.get("id")?,
        column_id: row.get("column_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn format_due_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DUE_DATE_FORMAT).to_string())
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: Id) -> OrderResult<Task> {
    conn.query_row(
        "SELECT * FROM tasks WHERE id = ?1",
        params![task_id],
        parse_task_row,
    )
    .optional()?
    .ok_or_else(|| OrderError::not_found("task", task_id))
}

/// Internal helper to list a column's tasks by order.
pub(crate) fn list_column_tasks_internal(conn: &Connection, column_id: Id) -> OrderResult<Vec<Task>> {
    let mut stmt = conn
        .prepare_cached("SELECT * FROM tasks WHERE column_id = ?1 ORDER BY sort_order, id")?;
    let tasks = stmt
        .query_map(params![column_id], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

impl Database {
    /// Create a task at the end of a column.
    pub fn create_task(
        &self,
        column_id: Id,
        title: &str,
        description: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> OrderResult<Task> {
        let title = validate_name("title", title)?;

        let task = self.with_ordered_tx(|tx| {
            let order = reorder::next_order(&SqliteSiblings::tasks(tx), column_id)?;
            let now = now_ms();

            tx.execute(
                "INSERT INTO tasks (column_id, title, description, due_date, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    column_id,
                    title,
                    description,
                    format_due_date(due_date),
                    order,
                    now,
                    now
                ],
            )?;

            Ok(Task {
                id: tx.last_insert_rowid(),
                column_id,
                title: title.clone(),
                description: description.clone(),
                due_date,
                order,
                created_at: now,
                updated_at: now,
            })
        })?;

        info!(task_id = task.id, column_id, order = task.order, "Created task");
        Ok(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: Id) -> OrderResult<Task> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks of one column, or of every column, sorted by column then order.
    pub fn list_tasks(&self, column_id: Option<Id>) -> OrderResult<Vec<Task>> {
        self.with_conn(|conn| match column_id {
            Some(column_id) => {
                if !SqliteSiblings::tasks(conn).parent_exists(column_id)? {
                    return Err(OrderError::not_found("column", column_id));
                }
                list_column_tasks_internal(conn, column_id)
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM tasks ORDER BY column_id, sort_order, id")?;
                let tasks = stmt
                    .query_map([], parse_task_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tasks)
            }
        })
    }

    /// List every task with a due date, earliest first, with its column and board.
    ///
    /// `from` and `to` are inclusive bounds; either may be omitted.
    pub fn list_due_tasks(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> OrderResult<Vec<DueTask>> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(OrderError::validation(format!(
                    "from ({}) is after to ({})",
                    from, to
                )));
            }
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT t.*, c.name AS column_name, b.id AS board_id, b.name AS board_name
                 FROM tasks t
                 JOIN board_columns c ON c.id = t.column_id
                 JOIN boards b ON b.id = c.board_id
                 WHERE t.due_date IS NOT NULL
                   AND (?1 IS NULL OR t.due_date >= ?1)
                   AND (?2 IS NULL OR t.due_date <= ?2)
                 ORDER BY t.due_date, t.id",
            )?;
            let tasks = stmt
                .query_map(
                    params![format_due_date(from), format_due_date(to)],
                    |row| {
                        Ok(DueTask {
                            task: parse_task_row(row)?,
                            column_name: row.get("column_name")?,
                            board_id: row.get("board_id")?,
                            board_name: row.get("board_name")?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Update a task's content. Position and column are never changed here.
    pub fn update_task(
        &self,
        task_id: Id,
        title: Option<String>,
        description: Option<Option<String>>,
        due_date: Option<Option<NaiveDate>>,
    ) -> OrderResult<Task> {
        let title = title.map(|t| validate_name("title", &t)).transpose()?;

        self.with_ordered_tx(|tx| {
            let task = get_task_internal(tx, task_id)?;

            let new_title = title.clone().unwrap_or(task.title.clone());
            let new_description = description.clone().unwrap_or(task.description.clone());
            let new_due_date = due_date.unwrap_or(task.due_date);

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    new_title,
                    new_description,
                    format_due_date(new_due_date),
                    now_ms(),
                    task_id
                ],
            )?;

            get_task_internal(tx, task_id)
        })
    }

    /// Move a task to a column and position.
    ///
    /// `order` of `None` appends to the target column (or moves the task last
    /// when it stays in its column). `from_order` is the position the caller
    /// last saw; the stored position is used when they differ.
    pub fn move_task(
        &self,
        task_id: Id,
        column_id: Id,
        order: Option<Order>,
        from_order: Option<Order>,
    ) -> OrderResult<(MoveOutcome, Task)> {
        let policy = self.reorder_config().target_index_policy;
        let (outcome, task) = self.with_ordered_tx(|tx| {
            let outcome = reorder::move_item(
                &SqliteSiblings::tasks(tx),
                task_id,
                column_id,
                order,
                from_order,
                policy,
            )?;
            Ok((outcome, get_task_internal(tx, task_id)?))
        })?;

        debug!(
            task_id,
            from_column = outcome.from_parent,
            to_column = outcome.to_parent,
            to_order = outcome.to_order,
            rows = outcome.rows_written,
            "Moved task"
        );
        Ok((outcome, task))
    }

    /// Replace the order of a column's tasks with the order of `ids`.
    pub fn reorder_tasks(&self, column_id: Id, ids: &OrderedIds) -> OrderResult<Vec<Task>> {
        self.with_ordered_tx(|tx| {
            let rewritten = reorder::reorder_explicit(&SqliteSiblings::tasks(tx), column_id, ids)?;
            debug!(column_id, rewritten, "Reordered tasks");
            list_column_tasks_internal(tx, column_id)
        })
    }

    /// Delete a task and close the gap in its column.
    pub fn delete_task(&self, task_id: Id) -> OrderResult<()> {
        let removed = self.with_ordered_tx(|tx| reorder::delete_item(&SqliteSiblings::tasks(tx), task_id))?;
        info!(task_id, column_id = removed.parent_id, "Deleted task");
        Ok(())
    }
}
