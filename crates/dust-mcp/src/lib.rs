//! dust-mcp: MCP (Model Context Protocol) Integration
//!
//! ToolManager に登録されたツールを MCP サーバーとして公開する機能を提供します。

pub mod server;

pub use server::{to_call_result, to_mcp_tool, DustMcpServer};
