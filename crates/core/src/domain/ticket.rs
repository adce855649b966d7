// Ticket Domain Model

use crate::domain::counter::CounterId;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ticket ID (store-assigned, increasing)
pub type TicketId = i64;

/// Ticket lifecycle status
///
/// `Waiting` is initial, `Completed` and `Cancelled` are terminal.
/// No edge ever returns to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Waiting,
    Called,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// Transition table
    ///
    /// `Waiting -> Cancelled` is only taken by the stale-ticket sweep (see [`Ticket::expire`]).
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, next) {
            (Waiting, Called) => true,
            (Waiting, Cancelled) => true,
            (Called, Completed) => true,
            (Called, Cancelled) => true,
            (Waiting, Waiting) | (Waiting, Completed) => false,
            (Called, Waiting) | (Called, Called) => false,
            (Completed, _) | (Cancelled, _) => false,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "called" => Ok(TicketStatus::Called),
            "completed" => Ok(TicketStatus::Completed),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Format a human-readable ticket number: `<prefix><zero-padded sequence>`
///
/// Sequences wider than `width` are printed in full.
pub fn format_ticket_number(prefix: &str, sequence: u32, width: usize) -> String {
    format!("{}{:0width$}", prefix, sequence, width = width)
}

/// A ticket about to be inserted by the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub number: String,
    pub queue_type: String,
    pub prefix: String,
    pub sequence: u32,
    pub issued_on: i64,
    pub created_at: i64,
}

/// Ticket Entity (one visitor in the line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub number: String,
    pub queue_type: String,
    pub prefix: String,
    pub sequence: u32,
    /// Local midnight (epoch ms) of the creation day
    pub issued_on: i64,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_id: Option<CounterId>,

    pub created_at: i64, // epoch ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub called_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Ticket {
    fn transition(&mut self, next: TicketStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Hand the ticket to a counter (`waiting -> called`)
    pub fn call(&mut self, counter_id: CounterId, now_millis: i64) -> Result<()> {
        self.transition(TicketStatus::Called)?;
        self.counter_id = Some(counter_id);
        self.called_at = Some(now_millis);
        Ok(())
    }

    /// Finish service (`called -> completed`)
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        self.transition(TicketStatus::Completed)?;
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Visitor did not show up (`called -> cancelled`)
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        if self.status != TicketStatus::Called {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: TicketStatus::Cancelled.to_string(),
            });
        }
        self.transition(TicketStatus::Cancelled)?;
        self.completed_at = Some(now_millis);
        Ok(())
    }

    /// Drop a ticket that waited too long (`waiting -> cancelled`)
    pub fn expire(&mut self, now_millis: i64) -> Result<()> {
        if self.status != TicketStatus::Waiting {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: TicketStatus::Cancelled.to_string(),
            });
        }
        self.transition(TicketStatus::Cancelled)?;
        self.completed_at = Some(now_millis);
        Ok(())
    }
}

#[cfg(test)]
impl Ticket {
    /// Waiting ticket with deterministic fields (tests only)
    pub fn new_test(id: TicketId, number: &str) -> Self {
        Self {
            id,
            number: number.to_string(),
            queue_type: "general".to_string(),
            prefix: "A".to_string(),
            sequence: id as u32,
            issued_on: 0,
            status: TicketStatus::Waiting,
            counter_id: None,
            created_at: id * 1000,
            called_at: None,
            completed_at: None,
        }
    }
}
