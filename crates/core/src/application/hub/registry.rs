// Subscriber registry (owned by the hub actor, read by publishers as a snapshot)

use crate::domain::{CounterId, DispatchEvent};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;
use tracing::debug;

/// Subscriber ID (hub-assigned, never reused)
pub type SubscriberId = u64;

/// Per-subscriber mailbox sender
pub(crate) type Mailbox = mpsc::Sender<DispatchEvent>;

/// What a subscriber listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionTarget {
    /// Public display (receives `ticket_called` and `queue_reset`)
    Display,
    /// One service counter
    Counter(CounterId),
}

impl std::fmt::Display for SubscriptionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTarget::Display => f.write_str("display"),
            SubscriptionTarget::Counter(id) => write!(f, "counter:{}", id),
        }
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Full or already closed mailboxes
    pub dropped: usize,
}

impl DeliveryReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.dropped
    }

    fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.dropped += other.dropped;
    }
}

/// Immutable view of every live mailbox
#[derive(Debug, Default, Clone)]
pub(crate) struct Registry {
    display: BTreeMap<SubscriberId, Mailbox>,
    counters: HashMap<CounterId, BTreeMap<SubscriberId, Mailbox>>,
}

impl Registry {
    pub(crate) fn insert(&mut self, id: SubscriberId, target: SubscriptionTarget, mailbox: Mailbox) {
        match target {
            SubscriptionTarget::Display => {
                self.display.insert(id, mailbox);
            }
            SubscriptionTarget::Counter(counter_id) => {
                self.counters
                    .entry(counter_id)
                    .or_default()
                    .insert(id, mailbox);
            }
        }
    }

    /// Returns false when `id` was not registered
    pub(crate) fn remove(&mut self, id: SubscriberId, target: SubscriptionTarget) -> bool {
        match target {
            SubscriptionTarget::Display => self.display.remove(&id).is_some(),
            SubscriptionTarget::Counter(counter_id) => {
                let Some(subscribers) = self.counters.get_mut(&counter_id) else {
                    return false;
                };
                let removed = subscribers.remove(&id).is_some();
                if subscribers.is_empty() {
                    self.counters.remove(&counter_id);
                }
                removed
            }
        }
    }

    pub(crate) fn display_count(&self) -> usize {
        self.display.len()
    }

    pub(crate) fn counter_count(&self, counter_id: CounterId) -> usize {
        self.counters.get(&counter_id).map_or(0, BTreeMap::len)
    }

    pub(crate) fn deliver_display(&self, event: &DispatchEvent) -> DeliveryReport {
        deliver(&self.display, event)
    }

    pub(crate) fn deliver_counter(&self, counter_id: CounterId, event: &DispatchEvent) -> DeliveryReport {
        self.counters
            .get(&counter_id)
            .map(|subscribers| deliver(subscribers, event))
            .unwrap_or_default()
    }

    pub(crate) fn deliver_all_counters(&self, event: &DispatchEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for subscribers in self.counters.values() {
            report.merge(deliver(subscribers, event));
        }
        report
    }
}

/// Non-blocking fan-out; a full mailbox loses this event only
fn deliver(subscribers: &BTreeMap<SubscriberId, Mailbox>, event: &DispatchEvent) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for (subscriber_id, mailbox) in subscribers {
        match mailbox.try_send(event.clone()) {
            Ok(()) => report.delivered += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                report.dropped += 1;
                debug!(
                    subscriber_id,
                    event = event.kind(),
                    "Mailbox full, event dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Unregister is already on its way to the actor
                report.dropped += 1;
            }
        }
    }

    report
}
