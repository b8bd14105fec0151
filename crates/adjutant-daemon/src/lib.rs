//! Background daemon process: owns the shared stores, boots the HTTP/MCP/WS
//! surface `adjutant-bridge` exposes, and runs the upkeep loops that don't
//! belong behind a request (prefix-map refresh, connection reaping).

pub mod daemon;
