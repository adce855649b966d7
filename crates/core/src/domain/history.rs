// Call History Domain Model (append-only)

use crate::domain::counter::CounterId;
use crate::domain::error::DomainError;
use crate::domain::ticket::TicketId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    Called,
    Recalled,
    Completed,
    Cancelled,
}

impl CallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallAction::Called => "called",
            CallAction::Recalled => "recalled",
            CallAction::Completed => "completed",
            CallAction::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for CallAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "called" => Ok(CallAction::Called),
            "recalled" => Ok(CallAction::Recalled),
            "completed" => Ok(CallAction::Completed),
            "cancelled" => Ok(CallAction::Cancelled),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallHistoryEntry {
    pub id: i64,
    pub ticket_id: TicketId,
    pub counter_id: CounterId,
    pub action: CallAction,
    pub timestamp: i64,
}
