//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for Ticketline: one method per engine
//! operation, plus WebSocket subscriptions that drive stream sessions.

pub mod error;
pub mod handler;
pub mod server;
pub mod sink;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
