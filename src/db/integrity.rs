//! Density checks and repair across every ordered list.

use super::{Database, SqliteSiblings};
use crate::error::OrderResult;
use crate::reorder::{self, SiblingStore, plan};
use crate::types::{Id, IntegrityReport, ListKind, OrderViolation};
use rusqlite::Connection;
use tracing::{info, warn};

const KINDS: [ListKind; 2] = [ListKind::Columns, ListKind::Tasks];

fn parent_ids(conn: &Connection, kind: ListKind) -> OrderResult<Vec<Id>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {} ORDER BY id", kind.parent_table()))?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

impl Database {
    /// Report every list whose orders are not exactly `0..n-1`.
    pub fn check_integrity(&self) -> OrderResult<IntegrityReport> {
        self.with_conn(|conn| {
            let mut report = IntegrityReport::default();

            for kind in KINDS {
                let store = SqliteSiblings::new(conn, kind);
                for parent_id in parent_ids(conn, kind)? {
                    report.lists_checked += 1;
                    let siblings = store.read_siblings(parent_id)?;
                    if !plan::is_dense(&siblings) {
                        report.violations.push(OrderViolation {
                            kind,
                            parent_id,
                            orders: siblings.iter().map(|s| (s.id, s.order)).collect(),
                        });
                    }
                }
            }

            if !report.is_clean() {
                warn!(
                    violations = report.violations.len(),
                    lists = report.lists_checked,
                    "Found lists with non-dense orders"
                );
            }
            Ok(report)
        })
    }

    /// Re-sequence every list in one transaction.
    ///
    /// Returns the number of rows whose order was rewritten.
    pub fn repair_orders(&self) -> OrderResult<usize> {
        let rewritten = self.with_ordered_tx(|tx| {
            let mut rewritten = 0;
            for kind in KINDS {
                let store = SqliteSiblings::new(tx, kind);
                for parent_id in parent_ids(tx, kind)? {
                    rewritten += reorder::resequence(&store, parent_id)?;
                }
            }
            Ok(rewritten)
        })?;

        info!(rewritten, "Repaired list orders");
        Ok(rewritten)
    }
}
