//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation, plus the
//! formatting and error classification behind each tool.

pub mod classify;
pub mod format;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;
