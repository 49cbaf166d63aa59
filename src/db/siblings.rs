//! SQLite-backed sibling store used by the reconciler.

use super::now_ms;
use crate::error::{OrderError, OrderResult};
use crate::reorder::SiblingStore;
use crate::types::{Id, ListKind, Order, OrderedItem};
use rusqlite::{Connection, OptionalExtension, params};

/// Reads and writes the `sort_order` of one kind of sibling set through a
/// connection that is expected to be inside an open transaction.
pub struct SqliteSiblings<'a> {
    conn: &'a Connection,
    kind: ListKind,
}

impl<'a> SqliteSiblings<'a> {
    pub fn new(conn: &'a Connection, kind: ListKind) -> Self {
        Self { conn, kind }
    }

    pub fn tasks(conn: &'a Connection) -> Self {
        Self::new(conn, ListKind::Tasks)
    }

    pub fn columns(conn: &'a Connection) -> Self {
        Self::new(conn, ListKind::Columns)
    }
}

fn parse_item(row: &rusqlite::Row) -> rusqlite::Result<OrderedItem> {
    Ok(OrderedItem {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        order: row.get(2)?,
    })
}

impl SiblingStore for SqliteSiblings<'_> {
    fn kind(&self) -> ListKind {
        self.kind
    }

    fn parent_exists(&self, parent_id: Id) -> OrderResult<bool> {
        let exists: bool = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
                self.kind.parent_table()
            ),
            params![parent_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn find_item(&self, item_id: Id) -> OrderResult<Option<OrderedItem>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, {}, sort_order FROM {} WHERE id = ?1",
                    self.kind.parent_column(),
                    self.kind.table()
                ),
                params![item_id],
                parse_item,
            )
            .optional()?;
        Ok(item)
    }

    fn read_siblings(&self, parent_id: Id) -> OrderResult<Vec<OrderedItem>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT id, {parent}, sort_order FROM {table}
             WHERE {parent} = ?1
             ORDER BY sort_order, id",
            parent = self.kind.parent_column(),
            table = self.kind.table()
        ))?;

        let items = stmt
            .query_map(params![parent_id], parse_item)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn write_orders(&self, parent_id: Id, orders: &[(Id, Order)]) -> OrderResult<()> {
        if orders.is_empty() {
            return Ok(());
        }

        let now = now_ms();
        let mut stmt = self.conn.prepare_cached(&format!(
            "UPDATE {table} SET sort_order = ?1, updated_at = ?2
             WHERE id = ?3 AND {parent} = ?4",
            parent = self.kind.parent_column(),
            table = self.kind.table()
        ))?;

        for (id, order) in orders {
            let updated = stmt.execute(params![order, now, id, parent_id])?;
            if updated != 1 {
                return Err(OrderError::conflict(format!(
                    "{} {} is no longer in {} {}",
                    self.kind.item_name(),
                    id,
                    self.kind.parent_name(),
                    parent_id
                )));
            }
        }

        Ok(())
    }

    fn reparent_and_order(
        &self,
        item_id: Id,
        expected_parent_id: Id,
        new_parent_id: Id,
        new_order: Order,
    ) -> OrderResult<()> {
        let updated = self.conn.execute(
            &format!(
                "UPDATE {table} SET {parent} = ?1, sort_order = ?2, updated_at = ?3
                 WHERE id = ?4 AND {parent} = ?5",
                parent = self.kind.parent_column(),
                table = self.kind.table()
            ),
            params![new_parent_id, new_order, now_ms(), item_id, expected_parent_id],
        )?;

        if updated != 1 {
            return Err(OrderError::conflict(format!(
                "{} {} is no longer in {} {}",
                self.kind.item_name(),
                item_id,
                self.kind.parent_name(),
                expected_parent_id
            )));
        }

        Ok(())
    }

    fn remove_item(&self, item_id: Id) -> OrderResult<()> {
        // Tasks of a removed column go with it through ON DELETE CASCADE.
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.kind.table()),
            params![item_id],
        )?;
        Ok(())
    }
}
