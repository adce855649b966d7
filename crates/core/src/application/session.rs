// Stream Session - forwards one subscription to one connected client

use crate::application::hub::Subscription;
use crate::application::shutdown::ShutdownToken;
use crate::port::{FrameSink, IdProvider, SessionFrame};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client disconnected or a write failed
    ClientGone,
    /// The hub closed the mailbox
    MailboxClosed,
    /// Process is shutting down
    Shutdown,
}

/// Stream session runner
pub struct StreamSession {
    id_provider: Arc<dyn IdProvider>,
    heartbeat_interval: Duration,
}

impl StreamSession {
    pub fn new(id_provider: Arc<dyn IdProvider>, heartbeat_interval: Duration) -> Self {
        Self {
            id_provider,
            heartbeat_interval,
        }
    }

    /// Pump events into `sink` until the client leaves, the mailbox closes or
    /// shutdown is requested. The subscription is released on every path.
    pub async fn run(
        &self,
        mut subscription: Subscription,
        sink: &dyn FrameSink,
        mut shutdown: ShutdownToken,
    ) -> SessionEnd {
        let session_id = self.id_provider.session_id();
        let target = subscription.target();
        info!(session_id = %session_id, %target, "Stream session opened");

        let end = if sink
            .send(SessionFrame::Connected {
                session_id: session_id.clone(),
            })
            .await
            .is_err()
        {
            SessionEnd::ClientGone
        } else {
            self.pump(&mut subscription, sink, &mut shutdown).await
        };

        subscription.unsubscribe().await;
        info!(session_id = %session_id, %target, end = ?end, "Stream session closed");
        end
    }

    async fn pump(
        &self,
        subscription: &mut Subscription,
        sink: &dyn FrameSink,
        shutdown: &mut ShutdownToken,
    ) -> SessionEnd {
        let mut heartbeat = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let frame = tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => SessionFrame::Event { event },
                    None => return SessionEnd::MailboxClosed,
                },
                _ = heartbeat.tick() => SessionFrame::Heartbeat,
                _ = sink.closed() => return SessionEnd::ClientGone,
                _ = shutdown.wait() => return SessionEnd::Shutdown,
            };

            if sink.send(frame).await.is_err() {
                debug!(subscriber_id = subscription.id(), "Frame write failed");
                return SessionEnd::ClientGone;
            }
        }
    }
}
