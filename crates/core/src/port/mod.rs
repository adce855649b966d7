// Port Layer - Interfaces for external dependencies

pub mod catalog;
pub mod frame_sink;
pub mod id_provider; // For deterministic testing
pub mod queue_repository;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use catalog::CatalogRepository;
pub use frame_sink::{FrameSink, SessionClosed, SessionFrame};
pub use id_provider::IdProvider;
pub use queue_repository::{QueueRepository, QueueStats, TicketFilter};
pub use time_provider::TimeProvider;
pub use transaction::{DispatchStore, DispatchTransaction, TicketScope, Transaction};
