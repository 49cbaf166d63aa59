//! Ordering under concurrent writers sharing one database file.
//!
//! Each thread uses its own `Database` handle, so the writers only meet at
//! SQLite's file lock, like separate server processes would.

use kanban_order_mcp::config::{BoardsConfig, ReorderConfig};
use kanban_order_mcp::db::{DEFAULT_BUSY_TIMEOUT_MS, Database};
use kanban_order_mcp::error::OrderError;
use kanban_order_mcp::types::{Id, Order};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn open(path: &Path) -> Database {
    Database::open_with(
        path,
        DEFAULT_BUSY_TIMEOUT_MS,
        ReorderConfig::default(),
        BoardsConfig::default(),
    )
    .expect("Failed to open database")
}

fn orders(db: &Database, column_id: Id) -> Vec<Order> {
    let mut orders: Vec<Order> = db
        .list_tasks(Some(column_id))
        .unwrap()
        .into_iter()
        .map(|t| t.order)
        .collect();
    orders.sort_unstable();
    orders
}

fn dense(n: usize) -> Vec<Order> {
    (0..n as Order).collect()
}

#[test]
fn concurrent_moves_and_creates_keep_columns_dense() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.db");

    let db = open(&path);
    let view = db.create_board("Shared", None).unwrap();
    let left = view.columns[0].column.id;
    let right = view.columns[1].column.id;
    for i in 0..6 {
        db.create_task(left, &format!("L{}", i), None, None).unwrap();
        db.create_task(right, &format!("R{}", i), None, None).unwrap();
    }

    const ROUNDS: usize = 30;
    const CREATES: usize = 10;

    let mover = |from: Id, to: Id, index: Order| {
        let db = open(&path);
        move || {
            for _ in 0..ROUNDS {
                let Some(task) = db.list_tasks(Some(from)).unwrap().into_iter().next() else {
                    continue;
                };
                // Past-the-end indexes clamp when the target has drained.
                db.move_task(task.id, to, Some(index), None).unwrap();
            }
        }
    };

    let creator = {
        let db = open(&path);
        move || {
            for i in 0..CREATES {
                db.create_task(left, &format!("N{}", i), None, None).unwrap();
            }
        }
    };

    let handles = vec![
        thread::spawn(mover(left, right, 0)),
        thread::spawn(mover(right, left, 1)),
        thread::spawn(creator),
    ];
    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let left_orders = orders(&db, left);
    let right_orders = orders(&db, right);
    assert_eq!(left_orders, dense(left_orders.len()));
    assert_eq!(right_orders, dense(right_orders.len()));
    assert_eq!(left_orders.len() + right_orders.len(), 12 + CREATES);
    assert!(db.check_integrity().unwrap().is_clean());
}

#[test]
fn concurrent_explicit_reorders_leave_one_complete_ordering() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.db");

    let db = open(&path);
    let view = db.create_board("Shared", None).unwrap();
    let column = view.columns[0].column.id;
    let ids: Vec<Id> = (0..5)
        .map(|i| db.create_task(column, &format!("T{}", i), None, None).unwrap().id)
        .collect();

    let forward = ids.clone();
    let backward: Vec<Id> = ids.iter().rev().copied().collect();

    let handles: Vec<_> = [forward.clone(), backward.clone()]
        .into_iter()
        .map(|wanted| {
            let db = open(&path);
            thread::spawn(move || {
                for _ in 0..20 {
                    db.reorder_tasks(column, &wanted.clone().into()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let result: Vec<Id> = db
        .list_tasks(Some(column))
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert!(result == forward || result == backward, "interleaved result {:?}", result);
    assert_eq!(orders(&db, column), dense(5));
}

#[test]
fn lock_held_past_retries_surfaces_conflict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.db");

    let holder = open(&path);
    let view = holder.create_board("Locked", None).unwrap();
    let column = view.columns[0].column.id;

    let impatient = Database::open_with(
        &path,
        0,
        ReorderConfig {
            max_attempts: 2,
            retry_backoff_ms: 1,
            ..ReorderConfig::default()
        },
        BoardsConfig::default(),
    )
    .unwrap();

    let attempt = holder
        .with_conn(|conn| {
            conn.execute_batch("BEGIN IMMEDIATE")?;
            let attempt = impatient.create_task(column, "Blocked", None, None);
            conn.execute_batch("ROLLBACK")?;
            Ok(attempt)
        })
        .unwrap();

    assert!(matches!(attempt, Err(OrderError::Conflict(_))));
    assert!(impatient.list_tasks(Some(column)).unwrap().is_empty());

    // Once the lock is gone the same call goes through.
    let task = impatient.create_task(column, "Unblocked", None, None).unwrap();
    assert_eq!(task.order, 0);
}

#[test]
fn lock_released_during_backoff_lets_the_same_call_succeed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.db");

    let setup = open(&path);
    let view = setup.create_board("Contended", None).unwrap();
    let column = view.columns[0].column.id;
    let existing: Vec<Id> = (0..3)
        .map(|i| setup.create_task(column, &format!("T{}", i), None, None).unwrap().id)
        .collect();

    // No busy wait: every blocked attempt fails straight into the backoff.
    let patient = Database::open_with(
        &path,
        0,
        ReorderConfig {
            max_attempts: 6,
            retry_backoff_ms: 40,
            ..ReorderConfig::default()
        },
        BoardsConfig::default(),
    )
    .unwrap();

    let (locked_tx, locked_rx) = mpsc::channel();
    let holder = {
        let db = open(&path);
        thread::spawn(move || {
            db.with_conn(|conn| {
                conn.execute_batch("BEGIN IMMEDIATE")?;
                locked_tx.send(()).expect("test thread gone");
                thread::sleep(Duration::from_millis(60));
                conn.execute_batch("ROLLBACK")?;
                Ok(())
            })
            .unwrap();
        })
    };

    locked_rx.recv().unwrap();
    let (outcome, task) = patient
        .move_task(existing[0], column, Some(2), None)
        .expect("move should succeed once the lock is released");
    holder.join().expect("lock holder panicked");

    assert_eq!(outcome.to_order, 2);
    assert_eq!(task.order, 2);
    assert_eq!(orders(&patient, column), dense(3));
    let ids: Vec<Id> = patient
        .list_tasks(Some(column))
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![existing[1], existing[2], existing[0]]);
}
