//! MCP tool surface for the express client.

pub mod server;

pub use server::ExpressService;
