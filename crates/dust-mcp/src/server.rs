//! MCP Server implementation
//!
//! rmcpを使用して、ToolManager に登録されたツールを
//! MCP クライアント（エージェントホスト）へ公開するサーバー

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool as McpTool,
    },
    service::{RequestContext, RoleServer},
    transport::stdio,
};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use dust_core::{McpServerConfig, ToolDefinition, ToolManager, ToolResult};

/// Convert a tool definition into an MCP tool listing entry
///
/// Non-object schemas are replaced with an empty object schema.
pub fn to_mcp_tool(definition: ToolDefinition) -> McpTool {
    let schema = match definition.input_schema {
        JsonValue::Object(map) => map,
        _ => JsonObject::new(),
    };
    McpTool::new(definition.name, definition.description, Arc::new(schema))
}

/// Convert a tool result into an MCP call result
pub fn to_call_result(result: ToolResult) -> CallToolResult {
    let content = vec![Content::text(result.output)];
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// MCP server exposing every tool in a [`ToolManager`]
#[derive(Clone)]
pub struct DustMcpServer {
    /// Registered tools
    tools: Arc<ToolManager>,
    /// Advertised server identity
    config: McpServerConfig,
}

impl DustMcpServer {
    /// Create a new server over the given tools
    pub fn new(tools: ToolManager, config: McpServerConfig) -> Self {
        Self {
            tools: Arc::new(tools),
            config,
        }
    }

    /// Tools as advertised by `tools/list`
    pub fn list(&self) -> Vec<McpTool> {
        self.tools
            .definitions()
            .into_iter()
            .map(to_mcp_tool)
            .collect()
    }

    /// Handle a `tools/call` request
    ///
    /// # Errors
    /// Unknown tools and manager-level failures become `invalid_params`;
    /// failures reported by the tool itself come back as an error result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool_name = name, "MCP tool call");

        let input = JsonValue::Object(arguments.unwrap_or_default());
        match self.tools.execute(name, input).await {
            Ok(result) => {
                if result.is_error {
                    warn!(tool_name = name, "Tool returned an error result");
                }
                Ok(to_call_result(result))
            }
            Err(e) => {
                warn!(tool_name = name, error = %e, "MCP tool call rejected");
                Err(McpError::invalid_params(e.to_string(), None))
            }
        }
    }

    /// Serve MCP over stdin/stdout until the client disconnects
    pub async fn serve_stdio(self) -> dust_core::Result<()> {
        info!(
            server_name = %self.config.server_name,
            tool_count = self.tools.len(),
            "Starting MCP server on stdio"
        );

        let service = self
            .serve(stdio())
            .await
            .map_err(|e| dust_core::Error::Mcp(format!("Failed to start MCP server: {}", e)))?;

        service
            .waiting()
            .await
            .map_err(|e| dust_core::Error::Mcp(format!("MCP server task failed: {}", e)))?;

        info!("MCP server stopped");
        Ok(())
    }
}

impl ServerHandler for DustMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = Implementation::from_build_env();
        implementation.name = self.config.server_name.clone();
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = implementation;
        info.instructions = Some(self.config.instructions.clone());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(&request.name, request.arguments).await
    }
}
