// Dispatch Events (payloads fanned out by the notification hub)

use crate::domain::counter::{Counter, CounterId};
use crate::domain::ticket::Ticket;
use serde::{Deserialize, Serialize};

/// Event pushed to display and counter subscribers
///
/// Serialized as `{"type": <kind>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DispatchEvent {
    TicketAdded(TicketAddedData),
    TicketCalled(TicketCalledData),
    CounterUpdated(CounterUpdateData),
    QueueReset(QueueResetData),
}

impl DispatchEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchEvent::TicketAdded(_) => "ticket_added",
            DispatchEvent::TicketCalled(_) => "ticket_called",
            DispatchEvent::CounterUpdated(_) => "counter_updated",
            DispatchEvent::QueueReset(_) => "queue_reset",
        }
    }

    pub fn ticket_called(ticket: &Ticket, counter: &Counter, timestamp: i64) -> Self {
        DispatchEvent::TicketCalled(TicketCalledData {
            ticket_number: ticket.number.clone(),
            counter_id: counter.id,
            counter_number: counter.number.clone(),
            counter_name: counter.name.clone(),
            timestamp,
        })
    }

    pub fn counter_updated(
        counter_id: CounterId,
        current_ticket: Option<&Ticket>,
        waiting_count: i64,
        timestamp: i64,
    ) -> Self {
        DispatchEvent::CounterUpdated(CounterUpdateData {
            counter_id,
            current_ticket: current_ticket.map(|t| t.number.clone()),
            waiting_count,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAddedData {
    pub waiting_count: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCalledData {
    pub ticket_number: String,
    pub counter_id: CounterId,
    pub counter_number: String,
    pub counter_name: String,
    pub timestamp: i64,
}

/// `counter_id` is the counter whose state changed; 0 for store-wide changes (sweeps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdateData {
    pub counter_id: CounterId,
    pub current_ticket: Option<String>,
    pub waiting_count: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueResetData {
    pub queue_type: Option<String>,
    pub affected: u64,
    pub waiting_count: i64,
    pub timestamp: i64,
}
