// Queue Repository Port (read side)

use crate::domain::{CallHistoryEntry, Ticket, TicketId, TicketStatus};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticket listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub queue_type: Option<String>,
    /// Local midnight (epoch ms) of the day to list
    pub issued_on: Option<i64>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

/// Per-day ticket counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: i64,
    pub waiting: i64,
    pub called: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub active_counters: i64,
}

/// Read-only views over tickets and history
#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn find_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// Newest first
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    async fn waiting_count(&self) -> Result<i64>;

    async fn waiting_count_by_type(&self) -> Result<BTreeMap<String, i64>>;

    async fn daily_stats(&self, issued_on: i64) -> Result<QueueStats>;

    /// Newest first
    async fn call_history(&self, limit: u32) -> Result<Vec<CallHistoryEntry>>;
}
