//! Pure order planning over a snapshot of one sibling set.
//!
//! Every function takes the current members of a single parent list and
//! returns the `(id, new_order)` pairs that must be written. Rows whose order
//! does not change are never part of a plan.

use crate::error::{OrderError, OrderResult};
use crate::types::{Id, Order, OrderedIds, OrderedItem};
use std::collections::{HashMap, HashSet};

/// A single order assignment to persist.
pub type OrderChange = (Id, Order);

/// Sort members by `(order, id)`; the id breaks ties left by duplicates.
pub fn sorted(siblings: &[OrderedItem]) -> Vec<OrderedItem> {
    let mut items = siblings.to_vec();
    items.sort_by_key(|item| (item.order, item.id));
    items
}

/// Order a newly appended member receives: `max + 1`, or `0` when empty.
pub fn next_order(siblings: &[OrderedItem]) -> Order {
    siblings
        .iter()
        .map(|item| item.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// True when the orders are exactly `{0, .., n-1}`.
pub fn is_dense(siblings: &[OrderedItem]) -> bool {
    let mut orders: Vec<Order> = siblings.iter().map(|item| item.order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order as usize == index)
}

/// Rewrite orders to `0..n-1` following the current relative order.
pub fn resequence(siblings: &[OrderedItem]) -> Vec<OrderChange> {
    sorted(siblings)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let index = index as Order;
            (item.order != index).then_some((item.id, index))
        })
        .collect()
}

/// Gap-shift plan for moving `item_id` from `old_order` to `new_order`.
///
/// Moving down decrements `(old, new]`; moving up increments `[new, old)`.
/// The moved item is always the last change in the plan.
pub fn shift_within(
    siblings: &[OrderedItem],
    item_id: Id,
    old_order: Order,
    new_order: Order,
) -> Vec<OrderChange> {
    if old_order == new_order {
        return Vec::new();
    }

    let mut changes: Vec<OrderChange> = sorted(siblings)
        .into_iter()
        .filter(|item| item.id != item_id)
        .filter_map(|item| {
            if old_order < new_order && item.order > old_order && item.order <= new_order {
                Some((item.id, item.order - 1))
            } else if old_order > new_order && item.order >= new_order && item.order < old_order {
                Some((item.id, item.order + 1))
            } else {
                None
            }
        })
        .collect();

    changes.push((item_id, new_order));
    changes
}

/// Shift every member at or after `index` up by one.
pub fn make_room(siblings: &[OrderedItem], index: Order) -> Vec<OrderChange> {
    sorted(siblings)
        .into_iter()
        .filter(|item| item.order >= index)
        .map(|item| (item.id, item.order + 1))
        .collect()
}

/// Assign `order = position` for an explicit, complete id list.
///
/// The list must name every member exactly once; anything else means the
/// caller's view of the list is stale and nothing is planned.
pub fn explicit(siblings: &[OrderedItem], ids: &OrderedIds) -> OrderResult<Vec<OrderChange>> {
    if ids.len() != siblings.len() {
        return Err(OrderError::validation(format!(
            "expected {} ids but got {}; the list has changed, re-fetch it",
            siblings.len(),
            ids.len()
        )));
    }

    let current: HashMap<Id, Order> = siblings.iter().map(|item| (item.id, item.order)).collect();
    let mut seen = HashSet::with_capacity(ids.len());
    let mut changes = Vec::new();

    for (index, id) in ids.iter().enumerate() {
        if !seen.insert(*id) {
            return Err(OrderError::validation(format!("id {} appears more than once", id)));
        }
        let Some(order) = current.get(id) else {
            return Err(OrderError::validation(format!(
                "id {} does not belong to this list",
                id
            )));
        };
        let index = index as Order;
        if *order != index {
            changes.push((*id, index));
        }
    }

    Ok(changes)
}

/// Apply a plan to a snapshot, returning members sorted by their new order.
pub fn apply(siblings: &[OrderedItem], changes: &[OrderChange]) -> Vec<OrderedItem> {
    let updates: HashMap<Id, Order> = changes.iter().copied().collect();
    let items: Vec<OrderedItem> = siblings
        .iter()
        .map(|item| OrderedItem {
            order: updates.get(&item.id).copied().unwrap_or(item.order),
            ..*item
        })
        .collect();
    sorted(&items)
}
