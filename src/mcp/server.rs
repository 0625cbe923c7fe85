//! MCP Server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.
//! Protocol messages go to stdout; diagnostics go through `tracing`.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::resources;
use crate::mcp::tools::ToolRegistry;
use crate::mcp::types::*;

/// MCP Server info
const SERVER_NAME: &str = "stripe-invoices";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Stripe invoices
pub struct McpServer {
    /// Tool registry
    tools: ToolRegistry,

    /// Whether the client sent `notifications/initialized`
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            initialized: false,
        }
    }

    /// Whether the client finished initialization
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve line-delimited JSON-RPC until the reader is exhausted
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                writer.write_all(response_str.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    pub async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable message");
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => Ok(self.handle_initialize()),
            methods::INITIALIZED => {
                self.initialized = true;
                return None;
            }
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => to_value(&ListToolsResult {
                tools: self.tools.list_tools(),
            }),
            methods::CALL_TOOL => self.handle_call_tool(&request).await,
            methods::LIST_RESOURCES => to_value(&ListResourcesResult {
                resources: resources::list_resources(),
            }),
            methods::READ_RESOURCE => self.handle_read_resource(&request),
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        // Notifications never get a response
        let id = id?;

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(error) => JsonRpcResponse::error(Some(id), error),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Value {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
            },
        };

        to_value(&result).unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(request)?;

        let result = self
            .tools
            .call_tool(&params.name, params.arguments)
            .await
            .map_err(JsonRpcError::from)?;

        to_value(&result)
    }

    /// Handle read resource request
    fn handle_read_resource(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: ReadResourceParams = parse_params(request)?;
        let result = resources::read_resource(&params.uri).map_err(JsonRpcError::from)?;
        to_value(&result)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    request: &JsonRpcRequest,
) -> std::result::Result<T, JsonRpcError> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing parameters"))?;

    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid parameters: {}", e)))
}

fn to_value<T: Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
