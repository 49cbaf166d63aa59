//! Ordered list reconciliation for tasks-in-column and columns-in-board.
//!
//! Every operation re-reads the sibling set(s) it touches through a
//! [`SiblingStore`], computes the new orders with [`plan`], and writes only the
//! rows that change. The store is expected to be bound to a single open
//! transaction, so an operation either applies completely or not at all.
//!
//! After each operation the members of every touched parent hold exactly the
//! orders `0..n-1`.

pub mod plan;

use crate::error::{OrderError, OrderResult};
use crate::types::{Id, ListKind, MoveOutcome, Order, OrderedIds, OrderedItem, TargetIndexPolicy};
use tracing::{debug, warn};

/// Row access needed by the reconciler for one kind of sibling set.
pub trait SiblingStore {
    /// Which sibling set this store reads and writes.
    fn kind(&self) -> ListKind;

    fn parent_exists(&self, parent_id: Id) -> OrderResult<bool>;

    fn find_item(&self, item_id: Id) -> OrderResult<Option<OrderedItem>>;

    /// Members of `parent_id`, sorted by `(order, id)`.
    fn read_siblings(&self, parent_id: Id) -> OrderResult<Vec<OrderedItem>>;

    /// Write new orders. Each row must still belong to `parent_id`; a row
    /// that does not is reported as [`OrderError::Conflict`].
    fn write_orders(&self, parent_id: Id, orders: &[(Id, Order)]) -> OrderResult<()>;

    /// Move an item to `new_parent_id` at `new_order`, conditioned on it still
    /// belonging to `expected_parent_id`.
    fn reparent_and_order(
        &self,
        item_id: Id,
        expected_parent_id: Id,
        new_parent_id: Id,
        new_order: Order,
    ) -> OrderResult<()>;

    /// Delete the item row together with anything that hangs off it.
    fn remove_item(&self, item_id: Id) -> OrderResult<()>;
}

fn require_parent<S: SiblingStore + ?Sized>(store: &S, parent_id: Id) -> OrderResult<()> {
    if store.parent_exists(parent_id)? {
        Ok(())
    } else {
        Err(OrderError::parent_not_found(store.kind(), parent_id))
    }
}

fn require_item<S: SiblingStore + ?Sized>(store: &S, item_id: Id) -> OrderResult<OrderedItem> {
    store
        .find_item(item_id)?
        .ok_or_else(|| OrderError::item_not_found(store.kind(), item_id))
}

/// Read a parent's members, closing any gaps left by earlier writers first.
fn read_dense<S: SiblingStore + ?Sized>(store: &S, parent_id: Id) -> OrderResult<Vec<OrderedItem>> {
    let siblings = store.read_siblings(parent_id)?;
    if plan::is_dense(&siblings) {
        return Ok(siblings);
    }

    let changes = plan::resequence(&siblings);
    warn!(
        kind = %store.kind(),
        parent_id,
        rows = changes.len(),
        "Found non-dense orders; re-sequencing before applying the change"
    );
    store.write_orders(parent_id, &changes)?;
    Ok(plan::apply(&siblings, &changes))
}

/// Order for a new item appended to `parent_id`.
pub fn next_order<S: SiblingStore + ?Sized>(store: &S, parent_id: Id) -> OrderResult<Order> {
    require_parent(store, parent_id)?;
    let siblings = store.read_siblings(parent_id)?;
    Ok(plan::next_order(&siblings))
}

/// Rewrite the orders of `parent_id` to `0..n-1`, keeping their sequence.
///
/// Returns the number of rows rewritten.
pub fn resequence<S: SiblingStore + ?Sized>(store: &S, parent_id: Id) -> OrderResult<usize> {
    let siblings = store.read_siblings(parent_id)?;
    let changes = plan::resequence(&siblings);
    if !changes.is_empty() {
        debug!(kind = %store.kind(), parent_id, rows = changes.len(), "Re-sequencing list");
        store.write_orders(parent_id, &changes)?;
    }
    Ok(changes.len())
}

/// Move an item to `to_order` inside its current parent.
///
/// `from_hint` is the order the caller believes the item has. The stored
/// order wins when they differ.
pub fn move_within_list<S: SiblingStore + ?Sized>(
    store: &S,
    parent_id: Id,
    item_id: Id,
    from_hint: Option<Order>,
    to_order: Order,
) -> OrderResult<MoveOutcome> {
    require_parent(store, parent_id)?;
    let item = require_item(store, item_id)?;
    if item.parent_id != parent_id {
        return Err(OrderError::validation(format!(
            "{} {} does not belong to {} {}",
            store.kind().item_name(),
            item_id,
            store.kind().parent_name(),
            parent_id
        )));
    }

    let siblings = read_dense(store, parent_id)?;
    let len = siblings.len() as Order;
    if to_order >= len {
        return Err(OrderError::validation(format!(
            "order {} is out of range; {} {} has {} {}",
            to_order,
            store.kind().parent_name(),
            parent_id,
            len,
            store.kind()
        )));
    }

    let from_order = siblings
        .iter()
        .find(|sibling| sibling.id == item_id)
        .map(|sibling| sibling.order)
        .ok_or_else(|| OrderError::item_not_found(store.kind(), item_id))?;

    if let Some(hint) = from_hint
        && hint != from_order
    {
        warn!(
            kind = %store.kind(),
            item_id,
            hint,
            stored = from_order,
            "Client order hint disagrees with stored order; using stored order"
        );
    }

    let changes = plan::shift_within(&siblings, item_id, from_order, to_order);
    debug!(
        kind = %store.kind(),
        parent_id,
        item_id,
        from_order,
        to_order,
        rows = changes.len(),
        "Moving within list"
    );
    store.write_orders(parent_id, &changes)?;

    Ok(MoveOutcome {
        item_id,
        from_parent: parent_id,
        from_order,
        to_parent: parent_id,
        to_order,
        rows_written: changes.len(),
    })
}

/// Move an item from `source_parent_id` into `target_parent_id`.
///
/// `target_index` of `None` appends. An index past the end is clamped or
/// rejected according to `policy`. Moving to the item's own parent is a
/// same-list move.
pub fn move_across_lists<S: SiblingStore + ?Sized>(
    store: &S,
    item_id: Id,
    source_parent_id: Id,
    target_parent_id: Id,
    target_index: Option<Order>,
    policy: TargetIndexPolicy,
) -> OrderResult<MoveOutcome> {
    let item = require_item(store, item_id)?;
    if item.parent_id != source_parent_id {
        return Err(OrderError::validation(format!(
            "{} {} is in {} {}, not {}",
            store.kind().item_name(),
            item_id,
            store.kind().parent_name(),
            item.parent_id,
            source_parent_id
        )));
    }

    if source_parent_id == target_parent_id {
        let last = store.read_siblings(source_parent_id)?.len().saturating_sub(1) as Order;
        return move_within_list(
            store,
            source_parent_id,
            item_id,
            None,
            target_index.unwrap_or(last),
        );
    }

    require_parent(store, target_parent_id)?;

    let from_order = item.order;
    let target = read_dense(store, target_parent_id)?;
    let target_len = target.len() as Order;

    let to_order = match target_index {
        None => target_len,
        Some(index) if index <= target_len => index,
        Some(index) => match policy {
            TargetIndexPolicy::Clamp => {
                debug!(index, target_len, "Clamping target index to end of list");
                target_len
            }
            TargetIndexPolicy::Reject => {
                return Err(OrderError::validation(format!(
                    "order {} is out of range; {} {} has {} {}",
                    index,
                    store.kind().parent_name(),
                    target_parent_id,
                    target_len,
                    store.kind()
                )));
            }
        },
    };

    // Make room, relocate, then close the hole in the source.
    let room = plan::make_room(&target, to_order);
    store.write_orders(target_parent_id, &room)?;
    store.reparent_and_order(item_id, source_parent_id, target_parent_id, to_order)?;
    let closed = resequence(store, source_parent_id)?;

    debug!(
        kind = %store.kind(),
        item_id,
        source_parent_id,
        target_parent_id,
        to_order,
        shifted = room.len(),
        closed,
        "Moved across lists"
    );

    Ok(MoveOutcome {
        item_id,
        from_parent: source_parent_id,
        from_order,
        to_parent: target_parent_id,
        to_order,
        rows_written: room.len() + 1 + closed,
    })
}

/// Move an item to a parent and position, dispatching on whether the
/// parent changes.
///
/// Within the same parent `target_index` of `None` moves the item last.
pub fn move_item<S: SiblingStore + ?Sized>(
    store: &S,
    item_id: Id,
    target_parent_id: Id,
    target_index: Option<Order>,
    from_hint: Option<Order>,
    policy: TargetIndexPolicy,
) -> OrderResult<MoveOutcome> {
    let item = require_item(store, item_id)?;
    if item.parent_id == target_parent_id {
        let to_order = match target_index {
            Some(index) => index,
            None => (store.read_siblings(target_parent_id)?.len().saturating_sub(1)) as Order,
        };
        move_within_list(store, target_parent_id, item_id, from_hint, to_order)
    } else {
        move_across_lists(
            store,
            item_id,
            item.parent_id,
            target_parent_id,
            target_index,
            policy,
        )
    }
}

/// Assign `order = position` for a complete, order-significant id list.
///
/// Returns the number of rows rewritten. Nothing is written when the list
/// does not match the parent's members exactly.
pub fn reorder_explicit<S: SiblingStore + ?Sized>(
    store: &S,
    parent_id: Id,
    ids: &OrderedIds,
) -> OrderResult<usize> {
    require_parent(store, parent_id)?;
    let siblings = store.read_siblings(parent_id)?;
    let changes = plan::explicit(&siblings, ids)?;
    debug!(kind = %store.kind(), parent_id, rows = changes.len(), "Explicit reorder");
    store.write_orders(parent_id, &changes)?;
    Ok(changes.len())
}

/// Remove an item and close the gap it leaves in its parent.
pub fn delete_item<S: SiblingStore + ?Sized>(store: &S, item_id: Id) -> OrderResult<OrderedItem> {
    let item = require_item(store, item_id)?;
    store.remove_item(item_id)?;
    let closed = resequence(store, item.parent_id)?;
    debug!(kind = %store.kind(), item_id, parent_id = item.parent_id, closed, "Deleted item");
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Sibling store over a plain vector, for exercising the operations
    /// without SQLite.
    struct MemStore {
        parents: HashSet<Id>,
        items: RefCell<Vec<OrderedItem>>,
        writes: RefCell<usize>,
    }

    impl MemStore {
        fn new(parents: &[Id], items: &[(Id, Id, Order)]) -> Self {
            Self {
                parents: parents.iter().copied().collect(),
                items: RefCell::new(
                    items
                        .iter()
                        .map(|(id, parent, order)| OrderedItem::new(*id, *parent, *order))
                        .collect(),
                ),
                writes: RefCell::new(0),
            }
        }

        fn ids_in(&self, parent_id: Id) -> Vec<Id> {
            self.read_siblings(parent_id)
                .unwrap()
                .iter()
                .map(|item| item.id)
                .collect()
        }

        fn orders_in(&self, parent_id: Id) -> Vec<(Id, Order)> {
            self.read_siblings(parent_id)
                .unwrap()
                .iter()
                .map(|item| (item.id, item.order))
                .collect()
        }
    }

    impl SiblingStore for MemStore {
        fn kind(&self) -> ListKind {
            ListKind::Tasks
        }

        fn parent_exists(&self, parent_id: Id) -> OrderResult<bool> {
            Ok(self.parents.contains(&parent_id))
        }

        fn find_item(&self, item_id: Id) -> OrderResult<Option<OrderedItem>> {
            Ok(self.items.borrow().iter().find(|i| i.id == item_id).copied())
        }

        fn read_siblings(&self, parent_id: Id) -> OrderResult<Vec<OrderedItem>> {
            let items: Vec<OrderedItem> = self
                .items
                .borrow()
                .iter()
                .filter(|i| i.parent_id == parent_id)
                .copied()
                .collect();
            Ok(plan::sorted(&items))
        }

        fn write_orders(&self, parent_id: Id, orders: &[(Id, Order)]) -> OrderResult<()> {
            let mut items = self.items.borrow_mut();
            for (id, order) in orders {
                let item = items
                    .iter_mut()
                    .find(|i| i.id == *id && i.parent_id == parent_id)
                    .ok_or_else(|| OrderError::conflict(format!("row {} moved", id)))?;
                item.order = *order;
                *self.writes.borrow_mut() += 1;
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
            let mut items = self.items.borrow_mut();
            let item = items
                .iter_mut()
                .find(|i| i.id == item_id && i.parent_id == expected_parent_id)
                .ok_or_else(|| OrderError::conflict("row moved"))?;
            item.parent_id = new_parent_id;
            item.order = new_order;
            *self.writes.borrow_mut() += 1;
            Ok(())
        }

        fn remove_item(&self, item_id: Id) -> OrderResult<()> {
            self.items.borrow_mut().retain(|i| i.id != item_id);
            Ok(())
        }
    }

    #[test]
    fn next_order_requires_existing_parent() {
        let store = MemStore::new(&[1], &[]);
        assert_eq!(next_order(&store, 1).unwrap(), 0);
        assert!(matches!(
            next_order(&store, 2),
            Err(OrderError::NotFound { kind: "column", id: 2 })
        ));
    }

    #[test]
    fn move_within_uses_stored_order_over_hint() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 1), (12, 1, 2)]);
        let outcome = move_within_list(&store, 1, 10, Some(2), 2).unwrap();
        assert_eq!(outcome.from_order, 0);
        assert_eq!(store.ids_in(1), vec![11, 12, 10]);
    }

    #[test]
    fn move_within_same_position_writes_nothing() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 1)]);
        let outcome = move_within_list(&store, 1, 11, Some(1), 1).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(*store.writes.borrow(), 0);
    }

    #[test]
    fn move_within_rejects_out_of_range_target() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 1)]);
        let err = move_within_list(&store, 1, 10, None, 2).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(store.orders_in(1), vec![(10, 0), (11, 1)]);
    }

    #[test]
    fn move_within_rejects_item_from_another_parent() {
        let store = MemStore::new(&[1, 2], &[(10, 1, 0), (20, 2, 0)]);
        let err = move_within_list(&store, 1, 20, None, 0).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn move_within_heals_gaps_first() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 4), (12, 1, 9)]);
        move_within_list(&store, 1, 12, None, 0).unwrap();
        assert_eq!(store.orders_in(1), vec![(12, 0), (10, 1), (11, 2)]);
    }

    #[test]
    fn cross_move_inserts_at_index_and_closes_source() {
        let store = MemStore::new(&[1, 2], &[(10, 1, 0), (11, 1, 1), (20, 2, 0)]);
        let outcome =
            move_across_lists(&store, 11, 1, 2, Some(0), TargetIndexPolicy::Clamp).unwrap();
        assert_eq!(outcome.to_order, 0);
        assert_eq!(store.orders_in(2), vec![(11, 0), (20, 1)]);
        assert_eq!(store.orders_in(1), vec![(10, 0)]);
    }

    #[test]
    fn cross_move_from_the_front_resequences_source() {
        let store = MemStore::new(&[1, 2], &[(10, 1, 0), (11, 1, 1), (12, 1, 2)]);
        move_across_lists(&store, 10, 1, 2, None, TargetIndexPolicy::Clamp).unwrap();
        assert_eq!(store.orders_in(1), vec![(11, 0), (12, 1)]);
        assert_eq!(store.orders_in(2), vec![(10, 0)]);
    }

    #[test]
    fn cross_move_clamps_or_rejects_past_the_end() {
        let store = MemStore::new(&[1, 2], &[(10, 1, 0), (11, 1, 1), (20, 2, 0)]);
        let err = move_across_lists(&store, 10, 1, 2, Some(5), TargetIndexPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(store.ids_in(2), vec![20]);

        let outcome =
            move_across_lists(&store, 10, 1, 2, Some(5), TargetIndexPolicy::Clamp).unwrap();
        assert_eq!(outcome.to_order, 1);
        assert_eq!(store.orders_in(2), vec![(20, 0), (10, 1)]);
    }

    #[test]
    fn cross_move_rejects_stale_source() {
        let store = MemStore::new(&[1, 2, 3], &[(10, 1, 0)]);
        let err = move_across_lists(&store, 10, 3, 2, None, TargetIndexPolicy::Clamp)
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(store.ids_in(1), vec![10]);
    }

    #[test]
    fn cross_move_to_missing_parent_fails() {
        let store = MemStore::new(&[1], &[(10, 1, 0)]);
        let err = move_across_lists(&store, 10, 1, 9, None, TargetIndexPolicy::Clamp)
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound { id: 9, .. }));
    }

    #[test]
    fn move_item_dispatches_on_parent() {
        let store = MemStore::new(&[1, 2], &[(10, 1, 0), (11, 1, 1), (20, 2, 0)]);

        move_item(&store, 10, 1, None, None, TargetIndexPolicy::Clamp).unwrap();
        assert_eq!(store.ids_in(1), vec![11, 10]);

        move_item(&store, 20, 1, Some(1), None, TargetIndexPolicy::Clamp).unwrap();
        assert_eq!(store.ids_in(1), vec![11, 20, 10]);
        assert!(store.ids_in(2).is_empty());
    }

    #[test]
    fn explicit_reorder_failure_changes_nothing() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 1), (13, 1, 2)]);
        let err = reorder_explicit(&store, 1, &OrderedIds::new(vec![10, 11])).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(store.orders_in(1), vec![(10, 0), (11, 1), (13, 2)]);
    }

    #[test]
    fn delete_closes_the_gap() {
        let store = MemStore::new(&[1], &[(10, 1, 0), (11, 1, 1), (12, 1, 2)]);
        let removed = delete_item(&store, 11).unwrap();
        assert_eq!(removed.parent_id, 1);
        assert_eq!(store.orders_in(1), vec![(10, 0), (12, 1)]);
    }
}
