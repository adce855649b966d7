// Transaction port for atomic dispatch operations

use crate::domain::{
    CallAction, Counter, CounterId, NewTicket, QueueType, Ticket, TicketId, TicketStatus,
};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
///
/// Dropping a transaction without calling `commit` rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Store that can open dispatch transactions
///
/// Implementations must serialize writers: a transaction that reads the
/// next waiting ticket must be able to claim it before any competing
/// transaction observes it.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Begin a new write transaction
    async fn begin(&self) -> Result<Box<dyn DispatchTransaction>>;
}

/// Set of tickets addressed by bulk administrative operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketScope {
    /// Only tickets issued on this day (local midnight, epoch ms)
    pub issued_on: Option<i64>,
    /// Only tickets of this queue type
    pub queue_type: Option<String>,
}

impl TicketScope {
    pub fn day(issued_on: i64, queue_type: Option<String>) -> Self {
        Self {
            issued_on: Some(issued_on),
            queue_type,
        }
    }
}

/// Queue and Counter store operations within a transaction
#[async_trait]
pub trait DispatchTransaction: Transaction {
    // Sequencer
    async fn find_queue_type(&mut self, code: &str) -> Result<Option<QueueType>>;

    /// Highest sequence issued for `prefix` (optionally only on `issued_on`)
    async fn max_sequence(&mut self, prefix: &str, issued_on: Option<i64>)
        -> Result<Option<u32>>;

    async fn insert_ticket(&mut self, ticket: &NewTicket) -> Result<Ticket>;

    // Dispatch
    async fn find_counter(&mut self, id: CounterId) -> Result<Option<Counter>>;

    async fn find_ticket(&mut self, id: TicketId) -> Result<Option<Ticket>>;

    /// Oldest waiting ticket (created_at, then id), optionally of one type
    async fn oldest_waiting(&mut self, queue_type: Option<&str>) -> Result<Option<Ticket>>;

    /// Persist a transitioned ticket, only if its stored status is still `expected`
    ///
    /// Fails with `AppError::Conflict` when the stored status differs.
    async fn save_ticket(&mut self, ticket: &Ticket, expected: TicketStatus) -> Result<()>;

    async fn save_counter(&mut self, counter: &Counter) -> Result<()>;

    async fn append_history(
        &mut self,
        ticket_id: TicketId,
        counter_id: CounterId,
        action: CallAction,
        at: i64,
    ) -> Result<()>;

    // Administrative sweeps
    /// Waiting tickets created before `created_before`, oldest first
    async fn stale_waiting(&mut self, created_before: i64) -> Result<Vec<Ticket>>;

    /// Clear counters holding a ticket in scope
    async fn release_counters(&mut self, scope: &TicketScope) -> Result<u64>;

    /// Delete history entries of tickets in scope
    async fn delete_history(&mut self, scope: &TicketScope) -> Result<u64>;

    /// Delete tickets in scope
    async fn delete_tickets(&mut self, scope: &TicketScope) -> Result<u64>;
}
