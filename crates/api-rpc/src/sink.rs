//! Frame sink backed by a jsonrpsee subscription

use async_trait::async_trait;
use jsonrpsee::{SubscriptionMessage, SubscriptionSink};
use ticketline_core::port::{FrameSink, SessionClosed, SessionFrame};
use tracing::warn;

/// Writes session frames as subscription notifications
pub struct RpcFrameSink {
    sink: SubscriptionSink,
}

impl RpcFrameSink {
    pub fn new(sink: SubscriptionSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl FrameSink for RpcFrameSink {
    async fn send(&self, frame: SessionFrame) -> Result<(), SessionClosed> {
        let message = SubscriptionMessage::from_json(&frame).map_err(|e| {
            warn!(error = %e, "Failed to encode session frame");
            SessionClosed
        })?;

        self.sink.send(message).await.map_err(|_| SessionClosed)
    }

    async fn closed(&self) {
        self.sink.closed().await;
    }
}
