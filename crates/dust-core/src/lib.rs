//! dust-core: Dust Gateway Core Library
//!
//! 設定の読み込み、ツールシステム、エラー型など
//! dust-gateway 全体で共有するコア機能を提供します。

pub mod config;
pub mod error;
pub mod tool;

pub use config::{Config, DustApiConfig, McpServerConfig};
pub use error::{Error, Result};
pub use tool::{SchemaBuilder, Tool, ToolDefinition, ToolManager, ToolResult};
