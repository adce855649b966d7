// Ticketline Core - Domain Logic, Ports & Dispatch Services
// NO infrastructure dependencies (storage and transport live in adapter crates)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
