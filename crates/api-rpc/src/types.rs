//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};
use ticketline_core::application::{CallNextOutcome, CounterOutcome, TodayStats};
use ticketline_core::domain::{
    CallHistoryEntry, Counter, CounterId, QueueType, QueueTypeUpdate, Ticket, TicketStatus,
};
use ticketline_core::port::TicketFilter;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 500;

/// ticket.take.v1 - Issue a ticket
#[derive(Debug, Default, Deserialize)]
pub struct TakeTicketRequest {
    #[serde(default)]
    pub queue_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeTicketResponse {
    pub ticket: Ticket,
}

/// counter.call_next.v1 - Complete the held ticket and call the next one
#[derive(Debug, Deserialize)]
pub struct CallNextRequest {
    pub counter_id: CounterId,
    #[serde(default)]
    pub queue_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallNextResponse {
    /// false when nothing was waiting
    pub called: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<Ticket>,
    pub counter: Counter,
}

impl From<CallNextOutcome> for CallNextResponse {
    fn from(outcome: CallNextOutcome) -> Self {
        match outcome {
            CallNextOutcome::Called {
                ticket,
                counter,
                released,
            } => Self {
                called: true,
                ticket: Some(ticket),
                released,
                counter,
            },
            CallNextOutcome::NoWaitingTicket { counter, released } => Self {
                called: false,
                ticket: None,
                released,
                counter,
            },
        }
    }
}

/// counter.recall.v1 / counter.complete.v1 / counter.cancel.v1
#[derive(Debug, Deserialize)]
pub struct CounterRequest {
    pub counter_id: CounterId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterActionResponse {
    /// false when the counter held no ticket
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

impl From<CounterOutcome> for CounterActionResponse {
    fn from(outcome: CounterOutcome) -> Self {
        match outcome {
            CounterOutcome::Applied { ticket, .. } => Self {
                applied: true,
                ticket: Some(ticket),
            },
            CounterOutcome::NoCurrentTicket => Self {
                applied: false,
                ticket: None,
            },
        }
    }
}

/// admin.reset_today.v1 - Delete today's tickets
#[derive(Debug, Default, Deserialize)]
pub struct ResetTodayRequest {
    #[serde(default)]
    pub queue_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetTodayResponse {
    pub deleted: u64,
}

/// admin.stats.v1 - Today's counts
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub today: TodayStats,
    pub display_subscribers: usize,
    pub uptime_seconds: u64,
}

/// counter.create.v1 - Register a service counter
#[derive(Debug, Deserialize)]
pub struct CreateCounterRequest {
    pub number: String,
    #[serde(default)]
    pub name: String,
}

/// counter.list.v1
#[derive(Debug, Clone, Serialize)]
pub struct CountersResponse {
    pub counters: Vec<Counter>,
}

/// queue_type.create.v1 - Register a queue type
#[derive(Debug, Deserialize)]
pub struct CreateQueueTypeRequest {
    pub code: String,
    pub name: String,
    pub prefix: String,
}

/// queue_type.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct ListQueueTypesRequest {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueTypesResponse {
    pub queue_types: Vec<QueueType>,
}

/// counter.subscribe.v1 - Stream one counter's events
#[derive(Debug, Deserialize)]
pub struct CounterSubscribeRequest {
    pub counter_id: CounterId,
}

/// counter.update.v1 - Rename or (de)activate a counter
#[derive(Debug, Deserialize)]
pub struct UpdateCounterRequest {
    pub counter_id: CounterId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// counter.delete.v1 / queue_type.delete.v1
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// queue_type.update.v1 - Edit a queue type by code
#[derive(Debug, Deserialize)]
pub struct UpdateQueueTypeRequest {
    pub code: String,
    #[serde(flatten)]
    pub update: QueueTypeUpdate,
}

/// queue_type.delete.v1
#[derive(Debug, Deserialize)]
pub struct QueueTypeCodeRequest {
    pub code: String,
}

/// ticket.list.v1 - Page through tickets, newest first
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsRequest {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub queue_type: Option<String>,
    /// Local midnight (epoch ms) of the day to list
    #[serde(default)]
    pub issued_on: Option<i64>,
    /// 1-based; 0 or missing means the first page
    #[serde(default)]
    pub page: Option<u32>,
    /// 1..=100; anything else falls back to 20
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ListTicketsRequest {
    pub fn page(&self) -> u32 {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn to_filter(&self) -> TicketFilter {
        let per_page = self.per_page();
        TicketFilter {
            status: self.status,
            queue_type: self.queue_type.clone(),
            issued_on: self.issued_on,
            limit: Some(per_page),
            offset: (self.page() - 1).saturating_mul(per_page),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<Ticket>,
    pub page: u32,
    pub per_page: u32,
}

/// admin.history.v1 - Latest call history entries
#[derive(Debug, Default, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub limit: Option<u32>,
}

impl HistoryRequest {
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<CallHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_request_pages_into_offsets() {
        let req: ListTicketsRequest =
            serde_json::from_value(json!({"status": "waiting", "page": 3, "per_page": 10}))
                .unwrap();
        let filter = req.to_filter();
        assert_eq!(filter.status, Some(TicketStatus::Waiting));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, 20);
    }

    #[test]
    fn test_list_request_falls_back_on_bad_paging() {
        let req: ListTicketsRequest =
            serde_json::from_value(json!({"page": 0, "per_page": 500})).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.per_page(), 20);
        assert_eq!(req.to_filter().offset, 0);
    }

    #[test]
    fn test_history_limit_is_clamped() {
        assert_eq!(HistoryRequest::default().limit(), 50);
        assert_eq!(HistoryRequest { limit: Some(0) }.limit(), 1);
        assert_eq!(HistoryRequest { limit: Some(10_000) }.limit(), 500);
    }

    #[test]
    fn test_queue_type_update_fields_are_optional() {
        let req: UpdateQueueTypeRequest =
            serde_json::from_value(json!({"code": "vip", "active": false})).unwrap();
        assert_eq!(req.code, "vip");
        assert_eq!(req.update.active, Some(false));
        assert!(req.update.prefix.is_none());
    }
}
