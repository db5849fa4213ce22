//! dust-gateway: Weekly Fine-Dust Forecast Gateway Main Binary
//!
//! Main entry point for the dust-gateway application.
//!
//! Usage:
//!   dust-gateway                 - Serve the forecast tool over MCP (stdio)
//!   dust-gateway --query [DATE]  - Run one lookup and print the result
//!   dust-gateway --list-tools    - List registered tools
//!   dust-gateway --help          - Show help

use dust_core::{Config, ToolManager};
use dust_mcp::DustMcpServer;
use dust_tools::{register_default_tools, TOOL_NAME};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// MCP server on stdio
    Serve,
    /// One-shot lookup; `None` means today
    Query(Option<String>),
    /// Print registered tools
    ListTools,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_args(&args);

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("dust-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Load .env file
    dotenvy::dotenv().ok();

    // stdout belongs to the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    let mut tool_manager = ToolManager::new();
    register_default_tools(&mut tool_manager, &config.dust_api);
    tracing::info!(
        "Registered {} tools: {:?}",
        tool_manager.len(),
        tool_manager.tool_names()
    );

    match mode {
        RunMode::Serve => {
            let server = DustMcpServer::new(tool_manager, config.mcp);
            server
                .serve_stdio()
                .await
                .map_err(|e| anyhow::anyhow!("MCP server error: {}", e))
        }
        RunMode::Query(date) => run_query(&tool_manager, date).await,
        RunMode::ListTools => {
            for definition in tool_manager.definitions() {
                println!("{}\t{}", definition.name, definition.description);
            }
            Ok(())
        }
        RunMode::Help | RunMode::Version => Ok(()),
    }
}

/// Parse command line arguments (without the program name)
fn parse_args(args: &[String]) -> RunMode {
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--query" | "-q" => {
                let date = iter.next_if(|next| !next.starts_with('-')).cloned();
                return RunMode::Query(date);
            }
            "--list-tools" => return RunMode::ListTools,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-V" => return RunMode::Version,
            "--stdio" => return RunMode::Serve,
            _ => {}
        }
    }

    RunMode::Serve
}

/// Run a single lookup and print its text
async fn run_query(tool_manager: &ToolManager, date: Option<String>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(today);
    tracing::info!(date = %date, "Running one-shot forecast lookup");

    let result = tool_manager
        .execute(TOOL_NAME, json!({ "date": date }))
        .await
        .map_err(|e| anyhow::anyhow!("Tool execution failed: {}", e))?;

    println!("{}", result.output.trim_end());
    if result.is_error {
        anyhow::bail!("forecast lookup failed");
    }
    Ok(())
}

/// Today's date as `yyyy-MM-dd` in local time
fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Print help message
fn print_help() {
    println!("dust-gateway - Weekly fine-dust forecast tool server");
    println!();
    println!("Usage:");
    println!("  dust-gateway                 Serve tools over MCP (stdio)");
    println!("  dust-gateway --query [DATE]  Look up one date (default: today)");
    println!("  dust-gateway --list-tools    List registered tools");
    println!("  dust-gateway --help          Show this help message");
    println!("  dust-gateway --version       Show version");
    println!();
    println!("Environment Variables:");
    println!("  DUST_API_KEY           data.go.kr service key (required)");
    println!("  DUST_API_BASE_URL      Override the forecast endpoint");
    println!("  DUST_API_TIMEOUT_SECS  Request timeout (default: 30)");
    println!("  MCP_SERVER_NAME        Advertised MCP server name");
    println!("  RUST_LOG               Log filter (default: info)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_default_serve() {
        assert_eq!(parse_args(&[]), RunMode::Serve);
        assert_eq!(parse_args(&args(&["--stdio"])), RunMode::Serve);
    }

    #[test]
    fn test_parse_args_query() {
        assert_eq!(
            parse_args(&args(&["--query", "20240101"])),
            RunMode::Query(Some("20240101".to_string()))
        );
        assert_eq!(parse_args(&args(&["-q"])), RunMode::Query(None));
        assert_eq!(parse_args(&args(&["-q", "--help"])), RunMode::Query(None));
    }

    #[test]
    fn test_parse_args_flags() {
        assert_eq!(parse_args(&args(&["--list-tools"])), RunMode::ListTools);
        assert_eq!(parse_args(&args(&["-h"])), RunMode::Help);
        assert_eq!(parse_args(&args(&["--version"])), RunMode::Version);
    }

    #[test]
    fn test_today_format() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[7..8], "-");
    }
}
