//! Core types for the kanban ordering server.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier (SQLite INTEGER PRIMARY KEY).
pub type Id = i64;

/// Zero-based position of an item within its parent list.
pub type Order = u32;

/// The two kinds of sibling sets whose members carry a dense `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Tasks within a column (`parent_id = column_id`).
    Tasks,
    /// Columns within a board (`parent_id = board_id`).
    Columns,
}

impl ListKind {
    /// Table holding the ordered items.
    pub fn table(self) -> &'static str {
        match self {
            ListKind::Tasks => "tasks",
            ListKind::Columns => "board_columns",
        }
    }

    /// Column referencing the owning list.
    pub fn parent_column(self) -> &'static str {
        match self {
            ListKind::Tasks => "column_id",
            ListKind::Columns => "board_id",
        }
    }

    /// Table holding the owning lists.
    pub fn parent_table(self) -> &'static str {
        match self {
            ListKind::Tasks => "board_columns",
            ListKind::Columns => "boards",
        }
    }

    /// Human name of a single item.
    pub fn item_name(self) -> &'static str {
        match self {
            ListKind::Tasks => "task",
            ListKind::Columns => "column",
        }
    }

    /// Human name of the owning list.
    pub fn parent_name(self) -> &'static str {
        match self {
            ListKind::Tasks => "column",
            ListKind::Columns => "board",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Tasks => write!(f, "tasks"),
            ListKind::Columns => write!(f, "columns"),
        }
    }
}

/// The ordering-relevant projection of a task or column row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub id: Id,
    pub parent_id: Id,
    pub order: Order,
}

impl OrderedItem {
    pub fn new(id: Id, parent_id: Id, order: Order) -> Self {
        Self {
            id,
            parent_id,
            order,
        }
    }
}

/// An order-significant list of item ids submitted for an explicit reorder.
///
/// Position in the list is the requested `order`. Membership is checked
/// against the stored sibling set before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedIds(Vec<Id>);

impl OrderedIds {
    pub fn new(ids: Vec<Id>) -> Self {
        Self(ids)
    }

    pub fn as_slice(&self) -> &[Id] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.0.iter()
    }
}

impl From<Vec<Id>> for OrderedIds {
    fn from(ids: Vec<Id>) -> Self {
        Self(ids)
    }
}

/// How an out-of-range target index for a cross-list move is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetIndexPolicy {
    /// Treat indexes past the end as "append".
    #[default]
    Clamp,
    /// Reject indexes past the end with a validation error.
    Reject,
}

/// A kanban board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A column of a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: Id,
    pub board_id: Id,
    pub name: String,
    pub order: Order,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task card within a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub column_id: Id,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub order: Order,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A dated task with the column and board it sits on, for calendar views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueTask {
    #[serde(flatten)]
    pub task: Task,
    pub column_name: String,
    pub board_id: Id,
    pub board_name: String,
}

/// A column with its tasks sorted by `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: BoardColumn,
    pub tasks: Vec<Task>,
}

/// A board with its columns (and their tasks) sorted by `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnView>,
}

/// Result of a single-item move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub item_id: Id,
    pub from_parent: Id,
    pub from_order: Order,
    pub to_parent: Id,
    pub to_order: Order,
    /// Rows whose order (or parent) was rewritten, including the moved item.
    pub rows_written: usize,
}

impl MoveOutcome {
    /// True when the move did not change anything.
    pub fn is_noop(&self) -> bool {
        self.rows_written == 0
    }
}

/// A sibling set whose orders are not `{0..n-1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderViolation {
    pub kind: ListKind,
    pub parent_id: Id,
    /// Current `(id, order)` pairs sorted by order.
    pub orders: Vec<(Id, Order)>,
}

/// Result of scanning every sibling set for density violations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub lists_checked: usize,
    pub violations: Vec<OrderViolation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
