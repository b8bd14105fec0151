//! MCP wire types, session registry, and tool dispatch for agents connected
//! over the `/mcp` transport.
//!
//! - `mcp`: JSON-RPC envelope and tool/resource/prompt descriptor types
//! - `session`: per-connection identity binding (`McpSessionRegistry`)
//! - `tool_handlers`: the dispatch table behind every callable tool
//! - `shutdown`: graceful-shutdown broadcast coordinator shared with the daemon

pub mod mcp;
pub mod session;
pub mod shutdown;
pub mod tool_handlers;
pub mod trace_ctx;
