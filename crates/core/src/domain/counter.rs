// Counter Domain Model

use crate::domain::ticket::TicketId;
use serde::{Deserialize, Serialize};

/// Counter ID (store-assigned)
pub type CounterId = i64;

/// Service point that calls and serves tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: CounterId,
    pub number: String,
    pub name: String,
    pub active: bool,
    /// Ticket currently held (always a `called` ticket assigned to this counter)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_ticket: Option<TicketId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_call_at: Option<i64>,
}

impl Counter {
    /// Take hold of a freshly called ticket
    pub fn hold(&mut self, ticket_id: TicketId, now_millis: i64) {
        self.current_ticket = Some(ticket_id);
        self.last_call_at = Some(now_millis);
    }

    /// Give up the held ticket after it left `called`
    pub fn release(&mut self) -> Option<TicketId> {
        self.current_ticket.take()
    }

    /// Back to the idle state (empty queue, or day reset)
    pub fn clear(&mut self) {
        self.current_ticket = None;
        self.last_call_at = None;
    }
}
