//! Field-by-field merging of configuration layers.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Maps merge key by key. Sequences and scalars in the overlay replace the
/// base value. A null in the overlay leaves the base value in place, so an
/// empty YAML key does not wipe out a default.
///
/// ```
/// use serde_json::json;
/// use kanban_order_mcp::config::deep_merge;
///
/// let defaults = json!({"reorder": {"max_attempts": 3, "retry_backoff_ms": 25}});
/// let project = json!({"reorder": {"max_attempts": 5}});
/// assert_eq!(
///     deep_merge(defaults, project),
///     json!({"reorder": {"max_attempts": 5, "retry_backoff_ms": 25}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge layers from lowest to highest priority.
pub fn deep_merge_all(layers: impl IntoIterator<Item = Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_merge_individually() {
        let base = json!({
            "server": {"db_path": "a.db", "busy_timeout_ms": 5000},
            "reorder": {"max_attempts": 3}
        });
        let overlay = json!({"server": {"db_path": "b.db"}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "server": {"db_path": "b.db", "busy_timeout_ms": 5000},
                "reorder": {"max_attempts": 3}
            })
        );
    }

    #[test]
    fn column_lists_are_replaced() {
        let base = json!({"boards": {"default_columns": ["To Do", "In Progress", "Done"]}});
        let overlay = json!({"boards": {"default_columns": ["Backlog", "Shipped"]}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"boards": {"default_columns": ["Backlog", "Shipped"]}})
        );
    }

    #[test]
    fn null_keeps_lower_layer() {
        let base = json!({"reorder": {"max_attempts": 3}});
        let overlay = json!({"reorder": {"max_attempts": null}});
        assert_eq!(deep_merge(base, overlay), json!({"reorder": {"max_attempts": 3}}));
    }

    #[test]
    fn later_layers_win() {
        let layers = vec![
            json!({"reorder": {"max_attempts": 3, "retry_backoff_ms": 25}}),
            json!({"reorder": {"max_attempts": 4}}),
            json!({"reorder": {"max_attempts": 6}, "boards": {"default_columns": ["Only"]}}),
        ];
        assert_eq!(
            deep_merge_all(layers),
            json!({
                "reorder": {"max_attempts": 6, "retry_backoff_ms": 25},
                "boards": {"default_columns": ["Only"]}
            })
        );
    }

    #[test]
    fn scalar_and_map_replace_each_other() {
        assert_eq!(
            deep_merge(json!({"server": 1}), json!({"server": {"db_path": "x"}})),
            json!({"server": {"db_path": "x"}})
        );
        assert_eq!(
            deep_merge(json!({"server": {"db_path": "x"}}), json!({"server": 1})),
            json!({"server": 1})
        );
    }
}
