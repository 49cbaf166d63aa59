//! CLI command definitions for kanban-order-mcp
//!
//! This module defines the CLI structure using clap's derive macros.

use clap::{Parser, Subcommand};

/// Kanban board MCP server with consistent column and task ordering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips project and user config)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the MCP server on stdio (default if no subcommand given)
    Serve,

    /// Report lists whose positions have gaps or duplicates; exits non-zero if any
    Check,

    /// Renumber every column and task list to 0..n-1
    Repair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_with_stderr_logging() {
        let cli = Cli::parse_from(["kanban-order-mcp"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["kanban-order-mcp", "check", "--database", "b.db", "-v"]);
        assert_eq!(cli.command, Some(Command::Check));
        assert_eq!(cli.database.as_deref(), Some("b.db"));
        assert!(cli.verbose);
    }
}
