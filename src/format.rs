//! Output formatting for board views.

use crate::types::{BoardView, Task};
use serde_json::Value;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Render a board as markdown, one section per column in display order.
pub fn format_board_markdown(view: &BoardView) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n", view.board.name));
    md.push_str(&format!("- **id**: `{}`\n", view.board.id));
    if let Some(ref desc) = view.board.description {
        md.push_str(&format!("\n{}\n", desc));
    }

    for entry in &view.columns {
        md.push_str(&format!(
            "\n## {}. {} ({})\n",
            entry.column.order,
            entry.column.name,
            entry.tasks.len()
        ));
        md.push_str(&format!("- **id**: `{}`\n", entry.column.id));

        if entry.tasks.is_empty() {
            md.push_str("_empty_\n");
            continue;
        }
        for task in &entry.tasks {
            md.push_str(&format_task_short(task));
        }
    }

    md
}

fn format_task_short(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| format!(" (due {})", d))
        .unwrap_or_default();
    format!("{}. {} `{}`{}\n", task.order, task.title, task.id, due)
}

/// Wrap markdown in a JSON value for uniform response handling.
pub fn markdown_to_json(md: String) -> Value {
    serde_json::json!({
        "format": "markdown",
        "content": md
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Board, BoardColumn, ColumnView};
    use chrono::NaiveDate;

    fn task(id: i64, order: u32, title: &str) -> Task {
        Task {
            id,
            column_id: 10,
            title: title.to_string(),
            description: None,
            due_date: None,
            order,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(OutputFormat::from_str("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yaml"), None);
    }

    #[test]
    fn board_markdown_lists_columns_and_tasks_in_order() {
        let mut due = task(2, 1, "Ship");
        due.due_date = NaiveDate::from_ymd_opt(2026, 3, 1);

        let view = BoardView {
            board: Board {
                id: 1,
                name: "Release".to_string(),
                description: None,
                created_at: 0,
                updated_at: 0,
            },
            columns: vec![
                ColumnView {
                    column: BoardColumn {
                        id: 10,
                        board_id: 1,
                        name: "To Do".to_string(),
                        order: 0,
                        created_at: 0,
                        updated_at: 0,
                    },
                    tasks: vec![task(1, 0, "Write notes"), due],
                },
                ColumnView {
                    column: BoardColumn {
                        id: 11,
                        board_id: 1,
                        name: "Done".to_string(),
                        order: 1,
                        created_at: 0,
                        updated_at: 0,
                    },
                    tasks: vec![],
                },
            ],
        };

        let md = format_board_markdown(&view);
        let todo = md.find("## 0. To Do (2)").unwrap();
        let done = md.find("## 1. Done (0)").unwrap();
        assert!(todo < done);
        assert!(md.contains("0. Write notes `1`"));
        assert!(md.contains("1. Ship `2` (due 2026-03-01)"));
        assert!(md.contains("_empty_"));
    }
}
