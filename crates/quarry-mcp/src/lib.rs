//! Quarry MCP Server
//!
//! Model Context Protocol server exposing collection search to AI assistants.

pub mod protocol;
mod server;
pub mod tools;

pub use server::{start_server, McpServer};
