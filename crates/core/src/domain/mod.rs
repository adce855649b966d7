// Domain Layer - Pure business logic and entities

pub mod counter;
pub mod error;
pub mod event;
pub mod history;
pub mod queue_type;
pub mod ticket;

// Re-exports
pub use counter::{Counter, CounterId};
pub use error::DomainError;
pub use event::{
    CounterUpdateData, DispatchEvent, QueueResetData, TicketAddedData, TicketCalledData,
};
pub use history::{CallAction, CallHistoryEntry};
pub use queue_type::{NewQueueType, QueueType, QueueTypeId, QueueTypeUpdate};
pub use ticket::{format_ticket_number, NewTicket, Ticket, TicketId, TicketStatus};
