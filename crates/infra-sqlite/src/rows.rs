// SQLite row representations and their domain conversions

use crate::error::corrupt_row;
use ticketline_core::domain::{
    CallAction, CallHistoryEntry, Counter, QueueType, Ticket, TicketStatus,
};
use ticketline_core::error::Result;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TicketRow {
    id: i64,
    number: String,
    queue_type: String,
    prefix: String,
    sequence: i64,
    issued_on: i64,
    status: String,
    counter_id: Option<i64>,
    created_at: i64,
    called_at: Option<i64>,
    completed_at: Option<i64>,
}

impl TicketRow {
    pub(crate) fn into_ticket(self) -> Result<Ticket> {
        let status: TicketStatus = self
            .status
            .parse()
            .map_err(|e| corrupt_row("ticket", e))?;
        let sequence = u32::try_from(self.sequence)
            .map_err(|_| corrupt_row("ticket", format!("sequence {}", self.sequence)))?;

        Ok(Ticket {
            id: self.id,
            number: self.number,
            queue_type: self.queue_type,
            prefix: self.prefix,
            sequence,
            issued_on: self.issued_on,
            status,
            counter_id: self.counter_id,
            created_at: self.created_at,
            called_at: self.called_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CounterRow {
    id: i64,
    number: String,
    name: String,
    active: bool,
    current_ticket_id: Option<i64>,
    last_call_at: Option<i64>,
}

impl From<CounterRow> for Counter {
    fn from(row: CounterRow) -> Self {
        Counter {
            id: row.id,
            number: row.number,
            name: row.name,
            active: row.active,
            current_ticket: row.current_ticket_id,
            last_call_at: row.last_call_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QueueTypeRow {
    id: i64,
    code: String,
    name: String,
    prefix: String,
    active: bool,
    sort_order: i32,
    created_at: i64,
}

impl From<QueueTypeRow> for QueueType {
    fn from(row: QueueTypeRow) -> Self {
        QueueType {
            id: row.id,
            code: row.code,
            name: row.name,
            prefix: row.prefix,
            active: row.active,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CallHistoryRow {
    id: i64,
    ticket_id: i64,
    counter_id: i64,
    action: String,
    timestamp: i64,
}

impl CallHistoryRow {
    pub(crate) fn into_entry(self) -> Result<CallHistoryEntry> {
        let action: CallAction = self
            .action
            .parse()
            .map_err(|e| corrupt_row("call_history", e))?;

        Ok(CallHistoryEntry {
            id: self.id,
            ticket_id: self.ticket_id,
            counter_id: self.counter_id,
            action,
            timestamp: self.timestamp,
        })
    }
}

pub(crate) fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>> {
    rows.into_iter().map(TicketRow::into_ticket).collect()
}
