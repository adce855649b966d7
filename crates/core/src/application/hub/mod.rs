// Notification Hub - fans committed dispatch events out to stream sessions
//
// A single actor task owns the subscriber registry. Registration changes are
// sent to it as commands; after each change it publishes a fresh immutable
// snapshot. Publishers only read the latest snapshot and `try_send` into
// bounded mailboxes, so a publish never awaits and never waits on a slow client.

mod registry;

pub use registry::{DeliveryReport, SubscriberId, SubscriptionTarget};

use crate::application::constants::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MAILBOX_CAPACITY};
use crate::application::shutdown::ShutdownToken;
use crate::domain::{CounterId, DispatchEvent};
use crate::error::{AppError, Result};
use registry::{Mailbox, Registry};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Hub configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Events buffered per subscriber before new ones are dropped
    pub mailbox_capacity: usize,
    /// Stream session keep-alive period
    pub heartbeat_interval_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        }
    }
}

impl HubConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}

enum HubCommand {
    Register {
        id: SubscriberId,
        target: SubscriptionTarget,
        mailbox: Mailbox,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: SubscriberId,
        target: SubscriptionTarget,
        ack: Option<oneshot::Sender<()>>,
    },
}

/// Handle to the hub actor (cheap to share behind an `Arc`)
pub struct NotificationHub {
    commands: mpsc::UnboundedSender<HubCommand>,
    snapshot: watch::Receiver<Arc<Registry>>,
    next_id: AtomicU64,
    config: HubConfig,
}

impl NotificationHub {
    /// Spawn the actor task
    ///
    /// The actor stops when `shutdown` fires or once every handle and
    /// subscription is gone. On shutdown every mailbox is closed, which ends
    /// the attached stream sessions.
    pub fn spawn(config: HubConfig, shutdown: ShutdownToken) -> (Self, JoinHandle<()>) {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshot) = watch::channel(Arc::new(Registry::default()));

        let handle = tokio::spawn(run_actor(inbox, publisher, shutdown));

        let hub = Self {
            commands,
            snapshot,
            next_id: AtomicU64::new(1),
            config,
        };
        (hub, handle)
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new subscriber
    ///
    /// Returns once the actor has applied the registration, so every publish
    /// that starts afterwards reaches the new mailbox.
    pub async fn subscribe(&self, target: SubscriptionTarget) -> Result<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (mailbox, receiver) = mpsc::channel(self.config.mailbox_capacity.max(1));
        let (ack, acked) = oneshot::channel();

        self.commands
            .send(HubCommand::Register {
                id,
                target,
                mailbox,
                ack,
            })
            .map_err(|_| hub_stopped())?;
        acked.await.map_err(|_| hub_stopped())?;

        Ok(Subscription {
            id,
            target,
            receiver,
            commands: self.commands.clone(),
            registered: true,
        })
    }

    /// Deliver to every display subscriber
    pub fn publish_to_display(&self, event: &DispatchEvent) -> DeliveryReport {
        let report = self.snapshot.borrow().deliver_display(event);
        log_publish("display", event, report);
        report
    }

    /// Deliver to the subscribers of one counter
    pub fn publish_to_counter(&self, counter_id: CounterId, event: &DispatchEvent) -> DeliveryReport {
        let report = self.snapshot.borrow().deliver_counter(counter_id, event);
        log_publish("counter", event, report);
        report
    }

    /// Deliver to the subscribers of every counter
    pub fn publish_to_all_counters(&self, event: &DispatchEvent) -> DeliveryReport {
        let report = self.snapshot.borrow().deliver_all_counters(event);
        log_publish("all_counters", event, report);
        report
    }

    pub fn display_subscribers(&self) -> usize {
        self.snapshot.borrow().display_count()
    }

    pub fn counter_subscribers(&self, counter_id: CounterId) -> usize {
        self.snapshot.borrow().counter_count(counter_id)
    }
}

fn hub_stopped() -> AppError {
    AppError::Internal("notification hub is not running".to_string())
}

fn log_publish(audience: &str, event: &DispatchEvent, report: DeliveryReport) {
    debug!(
        audience,
        event = event.kind(),
        delivered = report.delivered,
        dropped = report.dropped,
        "Event published"
    );
}

async fn run_actor(
    mut inbox: mpsc::UnboundedReceiver<HubCommand>,
    publisher: watch::Sender<Arc<Registry>>,
    mut shutdown: ShutdownToken,
) {
    let mut registry = Registry::default();
    debug!("Notification hub started");

    loop {
        let command = tokio::select! {
            command = inbox.recv() => command,
            _ = shutdown.wait() => None,
        };
        let Some(command) = command else {
            break;
        };

        match command {
            HubCommand::Register {
                id,
                target,
                mailbox,
                ack,
            } => {
                registry.insert(id, target, mailbox);
                publisher.send_replace(Arc::new(registry.clone()));
                debug!(subscriber_id = id, %target, "Subscriber registered");
                let _ = ack.send(());
            }
            HubCommand::Unregister { id, target, ack } => {
                if registry.remove(id, target) {
                    publisher.send_replace(Arc::new(registry.clone()));
                    debug!(subscriber_id = id, %target, "Subscriber unregistered");
                }
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
        }
    }

    // Dropping every sender closes all mailboxes
    publisher.send_replace(Arc::new(Registry::default()));
    info!("Notification hub stopped");
}

/// Receive side of one subscriber's mailbox
///
/// Dropping it unregisters the subscriber.
pub struct Subscription {
    id: SubscriberId,
    target: SubscriptionTarget,
    receiver: mpsc::Receiver<DispatchEvent>,
    commands: mpsc::UnboundedSender<HubCommand>,
    registered: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn target(&self) -> SubscriptionTarget {
        self.target
    }

    /// Next event; `None` once the mailbox is closed
    pub async fn recv(&mut self) -> Option<DispatchEvent> {
        self.receiver.recv().await
    }

    /// Unregister and wait until the hub has forgotten this subscriber
    pub async fn unsubscribe(mut self) {
        self.receiver.close();
        if !self.registered {
            return;
        }
        self.registered = false;

        let (ack, acked) = oneshot::channel();
        let sent = self.commands.send(HubCommand::Unregister {
            id: self.id,
            target: self.target,
            ack: Some(ack),
        });
        if sent.is_ok() {
            let _ = acked.await;
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registered {
            let _ = self.commands.send(HubCommand::Unregister {
                id: self.id,
                target: self.target,
                ack: None,
            });
        }
    }
}
