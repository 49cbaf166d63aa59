//! Kanban Order MCP Server
//!
//! An MCP server for kanban boards whose column and task positions stay
//! dense and consistent under concurrent moves.

use anyhow::Result;
use clap::Parser;
use kanban_order_mcp::cli::{Cli, Command};
use kanban_order_mcp::config::{Config, ConfigLoader};
use kanban_order_mcp::db::Database;
use kanban_order_mcp::error::ToolError;
use kanban_order_mcp::logging::{LogLevelFilter, Logger};
use kanban_order_mcp::tools::{ToolContext, ToolHandler};
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const INSTRUCTIONS: &str = "\
Kanban boards with ordered columns and tasks. Positions are zero-based and always 0..n-1 per list.
Start: list_boards() \u{2192} get_board(board) \u{2192} move_task(task, column, order) or reorder_tasks(column, task_ids).
On a CONFLICT or VALIDATION_FAILED error, re-fetch the board with get_board and retry with fresh positions.";

/// MCP server handler.
#[derive(Clone)]
struct KanbanOrderServer {
    tool_handler: Arc<ToolHandler>,
    /// Client-adjustable via logging/setLevel.
    level_filter: Arc<LogLevelFilter>,
}

impl KanbanOrderServer {
    fn new(db: Arc<Database>, level_filter: Arc<LogLevelFilter>) -> Self {
        Self {
            tool_handler: Arc::new(ToolHandler::new(db)),
            level_filter,
        }
    }
}

impl ServerHandler for KanbanOrderServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "kanban-order-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        self.level_filter.set(request.level);
        info!(level = ?request.level, "Logging level updated via MCP");
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.to_string();
        let start = std::time::Instant::now();

        let logger = Logger::new(format!("tool:{}", tool_name))
            .with_peer(context.peer.clone())
            .with_level_filter(Arc::clone(&self.level_filter));
        let tool_ctx = ToolContext::new(logger);

        // SQLite work blocks; keep it off the async workers.
        let handler = Arc::clone(&self.tool_handler);
        let args = Value::Object(request.arguments.unwrap_or_default());
        let name = tool_name.clone();
        let outcome =
            tokio::task::spawn_blocking(move || handler.call_tool(&name, args, &tool_ctx)).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let result = match outcome {
            Ok(result) => result.map_err(ToolError::from),
            Err(join_err) => Err(ToolError::internal(join_err)),
        };

        match result {
            Ok(value) => {
                debug!(tool = %tool_name, duration_ms = elapsed_ms, "Tool call succeeded");
                Ok(CallToolResult {
                    content: vec![Content::text(value.to_string())],
                    is_error: None,
                    meta: None,
                    structured_content: None,
                })
            }
            Err(tool_err) => {
                warn!(
                    tool = %tool_name,
                    error_code = ?tool_err.code,
                    error_message = %tool_err.message,
                    duration_ms = elapsed_ms,
                    "Tool call failed"
                );
                let error_json = serde_json::to_string(&tool_err)
                    .unwrap_or_else(|_| json!({ "error": tool_err.to_string() }).to_string());
                Ok(CallToolResult {
                    content: vec![Content::text(error_json)],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}

/// `RUST_LOG` wins over `--verbose` when set.
fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_logging(cli: &Cli) -> Result<()> {
    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(Path::new(path))?,
        None => ConfigLoader::load()?,
    };
    for (tier, path) in loader.sources() {
        debug!(%tier, path = %path.display(), "Using config file");
    }

    if let Some(db_path) = &cli.database {
        loader.config_mut().server.db_path = db_path.into();
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Check) => run_check(&config),
        Some(Command::Repair) => run_repair(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    Database::open_with(
        &config.server.db_path,
        config.server.busy_timeout_ms,
        config.reorder.clone(),
        config.boards.clone(),
    )
}

/// Print the integrity report; exit with status 1 when any list is broken.
fn run_check(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let report = db.check_integrity()?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_repair(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let before = db.check_integrity()?;
    let rewritten = db.repair_orders()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "lists_checked": before.lists_checked,
            "lists_repaired": before.violations.len(),
            "rows_rewritten": rewritten
        }))?
    );
    Ok(())
}

/// Run the MCP server
async fn run_server(config: Config) -> Result<()> {
    info!(
        "Starting Kanban Order MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Database: {:?}", config.server.db_path);

    let db = Arc::new(open_database(&config)?);
    info!(
        max_attempts = config.reorder.max_attempts,
        policy = ?config.reorder.target_index_policy,
        "Database initialized successfully"
    );

    let report = db.check_integrity()?;
    if !report.is_clean() {
        warn!(
            lists = report.violations.len(),
            "Some lists have gaps or duplicate positions; they are renumbered on their next move. Run `kanban-order-mcp repair` to fix all now."
        );
    }

    let server = KanbanOrderServer::new(db, Arc::new(LogLevelFilter::default()));

    info!("Server ready, listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
