//! Order integrity tool.

use super::{ToolContext, make_tool};
use crate::db::Database;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![make_tool(
        "check_integrity",
        "Check that every column list and task list is numbered 0..n-1 without gaps or duplicates. Set repair: true to renumber broken lists.",
        json!({
            "repair": {
                "type": "boolean",
                "description": "Renumber every list after checking (default: false)"
            }
        }),
        vec![],
    )]
}

pub fn check_integrity(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let repair = args.get("repair").and_then(Value::as_bool).unwrap_or(false);

    let report = db.check_integrity()?;
    let mut result = serde_json::to_value(&report)?;

    if repair && !report.is_clean() {
        let rewritten = db.repair_orders().inspect_err(|e| {
            ctx.logger.error(&format!("Repair failed, nothing renumbered: {}", e));
        })?;
        ctx.logger.warning(&format!(
            "Repaired {} lists, {} rows renumbered",
            report.violations.len(),
            rewritten
        ));
        result["rows_rewritten"] = json!(rewritten);
    }

    Ok(result)
}
