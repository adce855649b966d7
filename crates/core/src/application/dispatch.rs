// Dispatch State Machine - call next / recall / complete / cancel
//
// Every operation runs inside one store transaction. Errors propagate with `?`
// before `commit`, and dropping the uncommitted transaction rolls it back, so
// partial transitions are never observable.

use crate::domain::{CallAction, Counter, CounterId, Ticket, TicketId, TicketStatus};
use crate::error::{AppError, Result};
use crate::port::{DispatchStore, DispatchTransaction, TicketScope, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of `call_next`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallNextOutcome {
    /// `ticket` is now held by `counter`
    Called {
        ticket: Ticket,
        counter: Counter,
        /// Previously held ticket, completed by this call
        released: Option<Ticket>,
    },
    /// Nothing was waiting; the counter is now idle
    NoWaitingTicket {
        counter: Counter,
        released: Option<Ticket>,
    },
}

impl CallNextOutcome {
    pub fn called_ticket(&self) -> Option<&Ticket> {
        match self {
            CallNextOutcome::Called { ticket, .. } => Some(ticket),
            CallNextOutcome::NoWaitingTicket { .. } => None,
        }
    }

    pub fn counter(&self) -> &Counter {
        match self {
            CallNextOutcome::Called { counter, .. } => counter,
            CallNextOutcome::NoWaitingTicket { counter, .. } => counter,
        }
    }

    pub fn released(&self) -> Option<&Ticket> {
        match self {
            CallNextOutcome::Called { released, .. } => released.as_ref(),
            CallNextOutcome::NoWaitingTicket { released, .. } => released.as_ref(),
        }
    }
}

/// Result of recall / complete / cancel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterOutcome {
    /// `ticket` is the held ticket after the operation
    Applied { ticket: Ticket, counter: Counter },
    /// The counter holds no ticket; nothing changed
    NoCurrentTicket,
}

impl CounterOutcome {
    pub fn ticket(&self) -> Option<&Ticket> {
        match self {
            CounterOutcome::Applied { ticket, .. } => Some(ticket),
            CounterOutcome::NoCurrentTicket => None,
        }
    }
}

/// How the held ticket leaves `called`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Complete,
    Cancel,
}

impl Finish {
    fn action(self) -> CallAction {
        match self {
            Finish::Complete => CallAction::Completed,
            Finish::Cancel => CallAction::Cancelled,
        }
    }
}

/// Dispatch service (the transactional state machine)
pub struct DispatchService {
    store: Arc<dyn DispatchStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl DispatchService {
    pub fn new(store: Arc<dyn DispatchStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// Complete the held ticket (if any) and hand the oldest waiting ticket to `counter_id`
    pub async fn call_next(
        &self,
        counter_id: CounterId,
        queue_type: Option<&str>,
    ) -> Result<CallNextOutcome> {
        let mut tx = self.store.begin().await?;
        let mut counter = load_counter(tx.as_mut(), counter_id).await?;
        let now = self.time_provider.now_millis();

        // Calling next implicitly completes the previous visitor
        let released = match counter.release() {
            Some(held) => {
                Some(finish_held(tx.as_mut(), held, counter_id, Finish::Complete, now).await?)
            }
            None => None,
        };

        let Some(mut ticket) = tx.oldest_waiting(queue_type).await? else {
            counter.clear();
            tx.save_counter(&counter).await?;
            tx.commit().await?;

            info!(counter_id, queue_type = ?queue_type, "No waiting ticket");
            return Ok(CallNextOutcome::NoWaitingTicket { counter, released });
        };

        ticket.call(counter.id, now)?;
        tx.save_ticket(&ticket, TicketStatus::Waiting).await?;

        counter.hold(ticket.id, now);
        tx.save_counter(&counter).await?;
        tx.append_history(ticket.id, counter.id, CallAction::Called, now)
            .await?;

        tx.commit().await?;

        info!(
            counter_id,
            ticket_id = ticket.id,
            ticket = %ticket.number,
            "Ticket called"
        );

        Ok(CallNextOutcome::Called {
            ticket,
            counter,
            released,
        })
    }

    /// Re-announce the held ticket without changing its status
    pub async fn recall(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        let mut tx = self.store.begin().await?;
        let counter = load_counter(tx.as_mut(), counter_id).await?;

        let Some(ticket_id) = counter.current_ticket else {
            debug!(counter_id, "Recall with no current ticket");
            return Ok(CounterOutcome::NoCurrentTicket);
        };

        let ticket = tx.find_ticket(ticket_id).await?.ok_or_else(|| {
            AppError::InvalidState(format!(
                "counter {} holds missing ticket {}",
                counter_id, ticket_id
            ))
        })?;

        let now = self.time_provider.now_millis();
        tx.append_history(ticket.id, counter.id, CallAction::Recalled, now)
            .await?;
        tx.commit().await?;

        info!(counter_id, ticket = %ticket.number, "Ticket recalled");
        Ok(CounterOutcome::Applied { ticket, counter })
    }

    /// Held ticket was served (`called -> completed`)
    pub async fn complete(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        self.finish(counter_id, Finish::Complete).await
    }

    /// Held ticket was not served (`called -> cancelled`)
    pub async fn cancel(&self, counter_id: CounterId) -> Result<CounterOutcome> {
        self.finish(counter_id, Finish::Cancel).await
    }

    async fn finish(&self, counter_id: CounterId, finish: Finish) -> Result<CounterOutcome> {
        let mut tx = self.store.begin().await?;
        let mut counter = load_counter(tx.as_mut(), counter_id).await?;

        let Some(held) = counter.release() else {
            debug!(counter_id, action = %finish.action(), "No current ticket");
            return Ok(CounterOutcome::NoCurrentTicket);
        };

        let now = self.time_provider.now_millis();
        let ticket = finish_held(tx.as_mut(), held, counter_id, finish, now).await?;

        tx.save_counter(&counter).await?;
        tx.commit().await?;

        info!(
            counter_id,
            ticket = %ticket.number,
            status = %ticket.status,
            "Ticket finished"
        );
        Ok(CounterOutcome::Applied { ticket, counter })
    }

    /// Cancel every waiting ticket older than `max_age`
    pub async fn auto_cancel_stale(&self, max_age: Duration) -> Result<u64> {
        let now = self.time_provider.now_millis();
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.saturating_sub(max_age_ms);

        let mut tx = self.store.begin().await?;
        let mut cancelled = 0;
        for mut ticket in tx.stale_waiting(cutoff).await? {
            ticket.expire(now)?;
            tx.save_ticket(&ticket, TicketStatus::Waiting).await?;
            cancelled += 1;
        }
        tx.commit().await?;

        if cancelled > 0 {
            info!(cancelled, cutoff, "Stale waiting tickets cancelled");
        }
        Ok(cancelled)
    }

    /// Delete today's tickets (optionally of one type) with their history,
    /// releasing any counter that holds one of them
    pub async fn reset_today(&self, queue_type: Option<&str>) -> Result<u64> {
        let scope = TicketScope::day(
            self.time_provider.today_start_millis(),
            queue_type.map(str::to_string),
        );

        let mut tx = self.store.begin().await?;
        let released_counters = tx.release_counters(&scope).await?;
        let history_rows = tx.delete_history(&scope).await?;
        let deleted = tx.delete_tickets(&scope).await?;
        tx.commit().await?;

        info!(
            queue_type = ?queue_type,
            deleted,
            released_counters,
            history_rows,
            "Today's tickets reset"
        );
        Ok(deleted)
    }
}

async fn load_counter(tx: &mut dyn DispatchTransaction, counter_id: CounterId) -> Result<Counter> {
    tx.find_counter(counter_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Counter {} not found", counter_id)))
}

/// Move the ticket held by `counter_id` out of `called` and record it
async fn finish_held(
    tx: &mut dyn DispatchTransaction,
    ticket_id: TicketId,
    counter_id: CounterId,
    finish: Finish,
    now: i64,
) -> Result<Ticket> {
    let mut ticket = tx.find_ticket(ticket_id).await?.ok_or_else(|| {
        AppError::InvalidState(format!(
            "counter {} holds missing ticket {}",
            counter_id, ticket_id
        ))
    })?;

    match finish {
        Finish::Complete => ticket.complete(now)?,
        Finish::Cancel => ticket.cancel(now)?,
    }
    tx.save_ticket(&ticket, TicketStatus::Called).await?;
    tx.append_history(ticket.id, counter_id, finish.action(), now)
        .await?;

    Ok(ticket)
}
