use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// MCP Protocol Types (Model Context Protocol)
// Implements the core JSON-RPC based protocol for tool/resource/prompt exchange
// between MCP servers and clients.
// ---------------------------------------------------------------------------

/// MCP protocol version.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

// ---------------------------------------------------------------------------
// JSON-RPC Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::Value::Number(1.into())),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Standard JSON-RPC error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

// ---------------------------------------------------------------------------
// MCP Tool Definition
// ---------------------------------------------------------------------------

/// An MCP tool that can be called by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
    /// MCP tool annotations (hints for the LLM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// MCP tool annotations — hints about tool behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Tool only reads data, doesn't modify state.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "readOnlyHint"
    )]
    pub read_only_hint: Option<bool>,
    /// Tool may perform destructive actions.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "destructiveHint"
    )]
    pub destructive_hint: Option<bool>,
    /// Calling tool multiple times with same args has same effect.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "idempotentHint"
    )]
    pub idempotent_hint: Option<bool>,
    /// Tool interacts with external world (network, etc).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "openWorldHint"
    )]
    pub open_world_hint: Option<bool>,
}

// ---------------------------------------------------------------------------
// MCP Resource
// ---------------------------------------------------------------------------

/// An MCP resource — a read-only data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResource {
    /// URI identifying this resource.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource content.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// Content of a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

// ---------------------------------------------------------------------------
// MCP Prompt
// ---------------------------------------------------------------------------

/// An MCP prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpPrompt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

// ---------------------------------------------------------------------------
// MCP Server Capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesCapability {
    #[serde(default)]
    pub subscribe: bool,
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsCapability {
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

// ---------------------------------------------------------------------------
// MCP Server Info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

// ---------------------------------------------------------------------------
// MCP Server Config — for connecting to external MCP servers
// ---------------------------------------------------------------------------

/// Configuration for connecting to an MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Human-readable name.
    pub name: String,
    /// Transport type.
    pub transport: McpTransport,
    /// Whether this server is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variables to pass to stdio transport.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

/// MCP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpTransport {
    /// Stdio transport — spawn a child process.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// SSE transport — connect to HTTP endpoint.
    Sse { url: String },
    /// Streamable HTTP transport (MCP 2025+).
    StreamableHttp { url: String },
}

// ---------------------------------------------------------------------------
// MCP Tool Registry — manages available tools from multiple servers
// ---------------------------------------------------------------------------

/// Tracks tools, resources, and prompts from multiple MCP servers.
#[derive(Debug)]
pub struct McpToolRegistry {
    /// Tools keyed by "server_name/tool_name".
    tools: HashMap<String, RegisteredTool>,
    /// Resources keyed by URI.
    resources: HashMap<String, RegisteredResource>,
    /// Prompts keyed by "server_name/prompt_name".
    prompts: HashMap<String, RegisteredPrompt>,
}

#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub server: String,
    pub tool: McpTool,
}

#[derive(Debug, Clone)]
pub struct RegisteredResource {
    pub server: String,
    pub resource: McpResource,
}

#[derive(Debug, Clone)]
pub struct RegisteredPrompt {
    pub server: String,
    pub prompt: McpPrompt,
}

impl McpToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            resources: HashMap::new(),
            prompts: HashMap::new(),
        }
    }

    /// Register tools from an MCP server.
    pub fn register_tools(&mut self, server_name: &str, tools: Vec<McpTool>) {
        for tool in tools {
            let key = format!("{}/{}", server_name, tool.name);
            debug!(key = %key, "registered MCP tool");
            self.tools.insert(
                key,
                RegisteredTool {
                    server: server_name.to_string(),
                    tool,
                },
            );
        }
    }

    /// Register resources from an MCP server.
    pub fn register_resources(&mut self, server_name: &str, resources: Vec<McpResource>) {
        for resource in resources {
            let key = resource.uri.clone();
            self.resources.insert(
                key,
                RegisteredResource {
                    server: server_name.to_string(),
                    resource,
                },
            );
        }
    }

    /// Register prompts from an MCP server.
    pub fn register_prompts(&mut self, server_name: &str, prompts: Vec<McpPrompt>) {
        for prompt in prompts {
            let key = format!("{}/{}", server_name, prompt.name);
            self.prompts.insert(
                key,
                RegisteredPrompt {
                    server: server_name.to_string(),
                    prompt,
                },
            );
        }
    }

    /// Remove all tools/resources/prompts from a server.
    pub fn unregister_server(&mut self, server_name: &str) {
        self.tools.retain(|_, v| v.server != server_name);
        self.resources.retain(|_, v| v.server != server_name);
        self.prompts.retain(|_, v| v.server != server_name);
        info!(server = server_name, "unregistered MCP server");
    }

    /// Get a tool by its qualified name ("server/tool").
    pub fn get_tool(&self, key: &str) -> Option<&RegisteredTool> {
        self.tools.get(key)
    }

    /// Find a tool by just the tool name (returns first match).
    pub fn find_tool_by_name(&self, tool_name: &str) -> Option<&RegisteredTool> {
        self.tools.values().find(|rt| rt.tool.name == tool_name)
    }

    /// List all registered tools.
    pub fn list_tools(&self) -> Vec<&RegisteredTool> {
        self.tools.values().collect()
    }

    /// List tools from a specific server.
    pub fn list_tools_for_server(&self, server_name: &str) -> Vec<&RegisteredTool> {
        self.tools
            .values()
            .filter(|rt| rt.server == server_name)
            .collect()
    }

    /// Get a resource by URI.
    pub fn get_resource(&self, uri: &str) -> Option<&RegisteredResource> {
        self.resources.get(uri)
    }

    /// List all resources.
    pub fn list_resources(&self) -> Vec<&RegisteredResource> {
        self.resources.values().collect()
    }

    /// List all prompts.
    pub fn list_prompts(&self) -> Vec<&RegisteredPrompt> {
        self.prompts.values().collect()
    }

    /// Total number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Total number of registered resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Total number of registered prompts.
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Convert all tools to the format expected by LLM providers.
    pub fn tools_for_llm(&self) -> Vec<crate::provider::Tool> {
        self.tools
            .values()
            .map(|rt| crate::provider::Tool {
                name: rt.tool.name.clone(),
                description: rt.tool.description.clone(),
                parameters: rt.tool.input_schema.clone(),
            })
            .collect()
    }

    /// List server names that have registered tools.
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.values().map(|rt| rt.server.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for McpToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// MCP Call/Result types
// ---------------------------------------------------------------------------

/// Request to call an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Result of an MCP tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolResultContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultContent {
    Text { text: String },
    Image { data: String, mime_type: String },
    Resource { resource: ResourceContent },
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Extract the first text content.
    pub fn text_content(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolResultContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
