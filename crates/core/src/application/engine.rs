// Queue Engine - commits a transition, then tells the hub about it

use crate::application::dispatch::{CallNextOutcome, CounterOutcome, DispatchService};
use crate::application::hub::{NotificationHub, Subscription, SubscriptionTarget};
use crate::application::sequencer::{SequencerConfig, TicketSequencer};
use crate::domain::{
    CallHistoryEntry, Counter, CounterId, DispatchEvent, DomainError, NewQueueType,
    QueueResetData, QueueType, QueueTypeUpdate, Ticket, TicketAddedData, TicketId,
};
use crate::error::{AppError, Result};
use crate::port::{
    CatalogRepository, DispatchStore, QueueRepository, QueueStats, TicketFilter, TimeProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Today's numbers for dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    pub issued_on: i64,
    #[serde(flatten)]
    pub stats: QueueStats,
    pub waiting_by_type: BTreeMap<String, i64>,
}

/// Engine facade used by every transport
pub struct QueueEngine {
    sequencer: TicketSequencer,
    dispatch: DispatchService,
    queue: Arc<dyn QueueRepository>,
    catalog: Arc<dyn CatalogRepository>,
    hub: Arc<NotificationHub>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueEngine {
    pub fn new<S>(
        store: Arc<S>,
        hub: Arc<NotificationHub>,
        time_provider: Arc<dyn TimeProvider>,
        config: SequencerConfig,
    ) -> Self
    where
        S: DispatchStore + QueueRepository + CatalogRepository + 'static,
    {
        let dispatch_store: Arc<dyn DispatchStore> = store.clone();
        Self {
            sequencer: TicketSequencer::new(
                Arc::clone(&dispatch_store),
                Arc::clone(&time_provider),
                config,
            ),
            dispatch: DispatchService::new(dispatch_store, Arc::clone(&time_provider)),
            queue: store.clone(),
            catalog: store,
            hub,
            time_provider,
        }
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    // ---- Dispatch ----

    /// Issue a ticket; counters learn the new waiting count
    pub async fn take_ticket(&self, queue_type: Option<&str>) -> Result<Ticket> {
        let ticket = self.sequencer.create_ticket(queue_type).await?;

        let event = DispatchEvent::TicketAdded(TicketAddedData {
            waiting_count: self.waiting_count_or_zero().await,
            timestamp: ticket.created_at,
        });
        self.hub.publish_to_all_counters(&event);

        Ok(ticket)
    }

    pub async fn call_next(
        &self,
        counter_id: CounterId,
        queue_type: Option<&str>,
    ) -> Result<CallNextOutcome> {
        let outcome = self.dispatch.call_next(counter_id, queue_type).await?;

        match &outcome {
            CallNextOutcome::Called { ticket, counter, .. } => {
                let now = ticket.called_at.unwrap_or_else(|| self.time_provider.now_millis());
                self.hub
                    .publish_to_display(&DispatchEvent::ticket_called(ticket, counter, now));
                self.publish_counter_update(counter.id, Some(ticket), now)
                    .await;
            }
            CallNextOutcome::NoWaitingTicket {
                counter,
                released: Some(_),
            } => {
                self.publish_counter_update(counter.id, None, self.time_provider.now_millis())
                    .await;
            }
            CallNextOutcome::NoWaitingTicket { released: None, .. } => {}
        }

        Ok(outcome)
    }

    /// Announce the held ticket on the display again
    pub async fn recall(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        let outcome = self.dispatch.recall(counter_id).await?;

        if let CounterOutcome::Applied { ticket, counter } = &outcome {
            let event =
                DispatchEvent::ticket_called(ticket, counter, self.time_provider.now_millis());
            self.hub.publish_to_display(&event);
        }

        Ok(outcome)
    }

    pub async fn complete(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        let outcome = self.dispatch.complete(counter_id).await?;
        self.publish_finished(&outcome).await;
        Ok(outcome)
    }

    pub async fn cancel(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        let outcome = self.dispatch.cancel(counter_id).await?;
        self.publish_finished(&outcome).await;
        Ok(outcome)
    }

    pub async fn reset_today(&self, queue_type: Option<&str>) -> Result<u64> {
        let affected = self.dispatch.reset_today(queue_type).await?;

        let event = DispatchEvent::QueueReset(QueueResetData {
            queue_type: queue_type.map(str::to_string),
            affected,
            waiting_count: self.waiting_count_or_zero().await,
            timestamp: self.time_provider.now_millis(),
        });
        self.hub.publish_to_all_counters(&event);
        self.hub.publish_to_display(&event);

        Ok(affected)
    }

    pub async fn auto_cancel_stale(&self, max_age: Duration) -> Result<u64> {
        let cancelled = self.dispatch.auto_cancel_stale(max_age).await?;

        if cancelled > 0 {
            // Store-wide change, not tied to one counter
            self.publish_counter_update(0, None, self.time_provider.now_millis())
                .await;
        }

        Ok(cancelled)
    }

    pub async fn subscribe(&self, target: SubscriptionTarget) -> Result<Subscription> {
        if let SubscriptionTarget::Counter(id) = target {
            self.require_counter(id).await?;
        }
        self.hub.subscribe(target).await
    }

    // ---- Queries ----

    pub async fn find_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.queue
            .find_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))
    }

    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.queue.list_tickets(filter).await
    }

    pub async fn waiting_count(&self) -> Result<i64> {
        self.queue.waiting_count().await
    }

    pub async fn stats_today(&self) -> Result<TodayStats> {
        let issued_on = self.time_provider.today_start_millis();
        Ok(TodayStats {
            issued_on,
            stats: self.queue.daily_stats(issued_on).await?,
            waiting_by_type: self.queue.waiting_count_by_type().await?,
        })
    }

    pub async fn call_history(&self, limit: u32) -> Result<Vec<CallHistoryEntry>> {
        self.queue.call_history(limit).await
    }

    // ---- Catalog ----

    pub async fn create_counter(&self, number: &str, name: &str) -> Result<Counter> {
        let number = number.trim();
        if number.is_empty() {
            return Err(AppError::Validation("counter number must not be empty".to_string()));
        }
        let name = match name.trim() {
            "" => format!("Counter {}", number),
            name => name.to_string(),
        };
        self.catalog.create_counter(number, &name).await
    }

    pub async fn list_counters(&self) -> Result<Vec<Counter>> {
        self.catalog.list_counters().await
    }

    /// Rename and/or (de)activate; omitted fields keep their value
    pub async fn update_counter(
        &self,
        id: CounterId,
        name: Option<&str>,
        active: Option<bool>,
    ) -> Result<Counter> {
        let current = self.require_counter(id).await?;
        let name = match name.map(str::trim) {
            Some("") => {
                return Err(AppError::Validation("counter name must not be empty".to_string()))
            }
            Some(name) => name.to_string(),
            None => current.name,
        };
        self.catalog
            .update_counter(id, &name, active.unwrap_or(current.active))
            .await
    }

    pub async fn delete_counter(&self, id: CounterId) -> Result<()> {
        self.catalog.delete_counter(id).await
    }

    pub async fn create_queue_type(&self, new: NewQueueType) -> Result<QueueType> {
        new.validate().map_err(validation_error)?;
        self.catalog
            .create_queue_type(&new, self.time_provider.now_millis())
            .await
    }

    pub async fn list_queue_types(&self, active_only: bool) -> Result<Vec<QueueType>> {
        self.catalog.list_queue_types(active_only).await
    }

    pub async fn find_queue_type(&self, code: &str) -> Result<QueueType> {
        self.catalog
            .find_queue_type(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Queue type {} not found", code)))
    }

    /// A new prefix applies to tickets issued afterwards; issued numbers keep theirs
    pub async fn update_queue_type(
        &self,
        code: &str,
        update: QueueTypeUpdate,
    ) -> Result<QueueType> {
        let mut queue_type = self.find_queue_type(code).await?;
        update.apply_to(&mut queue_type).map_err(validation_error)?;
        self.catalog.update_queue_type(&queue_type).await?;
        Ok(queue_type)
    }

    /// Existing tickets keep their code; new tickets of it fall back to the default prefix
    pub async fn delete_queue_type(&self, code: &str) -> Result<()> {
        let queue_type = self.find_queue_type(code).await?;
        self.catalog.delete_queue_type(queue_type.id).await
    }

    // ---- Helpers ----

    async fn require_counter(&self, id: CounterId) -> Result<Counter> {
        self.catalog
            .find_counter(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Counter {} not found", id)))
    }

    async fn publish_finished(&self, outcome: &CounterOutcome) {
        if let CounterOutcome::Applied { counter, ticket } = outcome {
            let now = ticket
                .completed_at
                .unwrap_or_else(|| self.time_provider.now_millis());
            self.publish_counter_update(counter.id, None, now).await;
        }
    }

    async fn publish_counter_update(&self, counter_id: CounterId, current: Option<&Ticket>, now: i64) {
        let event =
            DispatchEvent::counter_updated(counter_id, current, self.waiting_count_or_zero().await, now);
        self.hub.publish_to_all_counters(&event);
    }

    /// The transition is already committed; a failed count never undoes it
    async fn waiting_count_or_zero(&self) -> i64 {
        match self.queue.waiting_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = ?e, "Waiting count unavailable after commit");
                0
            }
        }
    }
}

fn validation_error(e: DomainError) -> AppError {
    match e {
        DomainError::ValidationError(msg) => AppError::Validation(msg),
        other => AppError::Domain(other),
    }
}
