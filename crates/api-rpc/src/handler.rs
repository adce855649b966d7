//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC requests to the queue engine.

use crate::error::to_rpc_error;
use crate::sink::RpcFrameSink;
use crate::types::{
    CallNextRequest, CallNextResponse, CounterActionResponse, CounterRequest, CountersResponse,
    CreateCounterRequest, CreateQueueTypeRequest, DeletedResponse, HistoryRequest,
    HistoryResponse, ListQueueTypesRequest, ListTicketsRequest, QueueTypeCodeRequest,
    QueueTypesResponse, ResetTodayRequest, ResetTodayResponse, StatsResponse, TakeTicketRequest,
    TakeTicketResponse, TicketsResponse, UpdateCounterRequest, UpdateQueueTypeRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::PendingSubscriptionSink;
use std::sync::Arc;
use ticketline_core::application::{
    QueueEngine, ShutdownToken, StreamSession, SubscriptionTarget,
};
use ticketline_core::domain::{Counter, NewQueueType, QueueType};
use ticketline_core::port::IdProvider;
use tracing::debug;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<QueueEngine>,
    session: StreamSession,
    shutdown: ShutdownToken,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        engine: Arc<QueueEngine>,
        id_provider: Arc<dyn IdProvider>,
        shutdown: ShutdownToken,
    ) -> Self {
        let heartbeat = engine.hub().config().heartbeat_interval();
        Self {
            engine,
            session: StreamSession::new(id_provider, heartbeat),
            shutdown,
            start_time: std::time::Instant::now(),
        }
    }

    /// ticket.take.v1
    pub async fn take_ticket(
        &self,
        params: TakeTicketRequest,
    ) -> Result<TakeTicketResponse, ErrorObjectOwned> {
        let ticket = self
            .engine
            .take_ticket(params.queue_type.as_deref())
            .await
            .map_err(to_rpc_error)?;

        Ok(TakeTicketResponse { ticket })
    }

    /// counter.call_next.v1
    pub async fn call_next(
        &self,
        params: CallNextRequest,
    ) -> Result<CallNextResponse, ErrorObjectOwned> {
        let outcome = self
            .engine
            .call_next(params.counter_id, params.queue_type.as_deref())
            .await
            .map_err(to_rpc_error)?;

        Ok(outcome.into())
    }

    /// counter.recall.v1
    pub async fn recall(
        &self,
        params: CounterRequest,
    ) -> Result<CounterActionResponse, ErrorObjectOwned> {
        let outcome = self
            .engine
            .recall(params.counter_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(outcome.into())
    }

    /// counter.complete.v1
    pub async fn complete(
        &self,
        params: CounterRequest,
    ) -> Result<CounterActionResponse, ErrorObjectOwned> {
        let outcome = self
            .engine
            .complete(params.counter_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(outcome.into())
    }

    /// counter.cancel.v1
    pub async fn cancel(
        &self,
        params: CounterRequest,
    ) -> Result<CounterActionResponse, ErrorObjectOwned> {
        let outcome = self
            .engine
            .cancel(params.counter_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(outcome.into())
    }

    /// admin.reset_today.v1
    pub async fn reset_today(
        &self,
        params: ResetTodayRequest,
    ) -> Result<ResetTodayResponse, ErrorObjectOwned> {
        let deleted = self
            .engine
            .reset_today(params.queue_type.as_deref())
            .await
            .map_err(to_rpc_error)?;

        Ok(ResetTodayResponse { deleted })
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        let today = self.engine.stats_today().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            today,
            display_subscribers: self.engine.hub().display_subscribers(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }

    /// admin.history.v1
    pub async fn history(
        &self,
        params: HistoryRequest,
    ) -> Result<HistoryResponse, ErrorObjectOwned> {
        let entries = self
            .engine
            .call_history(params.limit())
            .await
            .map_err(to_rpc_error)?;
        Ok(HistoryResponse { entries })
    }

    /// ticket.list.v1
    pub async fn list_tickets(
        &self,
        params: ListTicketsRequest,
    ) -> Result<TicketsResponse, ErrorObjectOwned> {
        let tickets = self
            .engine
            .list_tickets(&params.to_filter())
            .await
            .map_err(to_rpc_error)?;

        Ok(TicketsResponse {
            tickets,
            page: params.page(),
            per_page: params.per_page(),
        })
    }

    /// counter.create.v1
    pub async fn create_counter(
        &self,
        params: CreateCounterRequest,
    ) -> Result<Counter, ErrorObjectOwned> {
        self.engine
            .create_counter(&params.number, &params.name)
            .await
            .map_err(to_rpc_error)
    }

    /// counter.list.v1
    pub async fn list_counters(&self) -> Result<CountersResponse, ErrorObjectOwned> {
        let counters = self.engine.list_counters().await.map_err(to_rpc_error)?;
        Ok(CountersResponse { counters })
    }

    /// counter.update.v1
    pub async fn update_counter(
        &self,
        params: UpdateCounterRequest,
    ) -> Result<Counter, ErrorObjectOwned> {
        self.engine
            .update_counter(params.counter_id, params.name.as_deref(), params.active)
            .await
            .map_err(to_rpc_error)
    }

    /// counter.delete.v1
    pub async fn delete_counter(
        &self,
        params: CounterRequest,
    ) -> Result<DeletedResponse, ErrorObjectOwned> {
        self.engine
            .delete_counter(params.counter_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(DeletedResponse { deleted: true })
    }

    /// queue_type.create.v1
    pub async fn create_queue_type(
        &self,
        params: CreateQueueTypeRequest,
    ) -> Result<QueueType, ErrorObjectOwned> {
        self.engine
            .create_queue_type(NewQueueType {
                code: params.code,
                name: params.name,
                prefix: params.prefix,
            })
            .await
            .map_err(to_rpc_error)
    }

    /// queue_type.list.v1
    pub async fn list_queue_types(
        &self,
        params: ListQueueTypesRequest,
    ) -> Result<QueueTypesResponse, ErrorObjectOwned> {
        let queue_types = self
            .engine
            .list_queue_types(params.active_only)
            .await
            .map_err(to_rpc_error)?;
        Ok(QueueTypesResponse { queue_types })
    }

    /// queue_type.update.v1
    pub async fn update_queue_type(
        &self,
        params: UpdateQueueTypeRequest,
    ) -> Result<QueueType, ErrorObjectOwned> {
        self.engine
            .update_queue_type(&params.code, params.update)
            .await
            .map_err(to_rpc_error)
    }

    /// queue_type.delete.v1
    pub async fn delete_queue_type(
        &self,
        params: QueueTypeCodeRequest,
    ) -> Result<DeletedResponse, ErrorObjectOwned> {
        self.engine
            .delete_queue_type(&params.code)
            .await
            .map_err(to_rpc_error)?;
        Ok(DeletedResponse { deleted: true })
    }

    /// display.subscribe.v1 / counter.subscribe.v1
    ///
    /// Registers with the hub before accepting, so nothing published after
    /// the client sees the subscription id is missed.
    pub async fn stream(&self, pending: PendingSubscriptionSink, target: SubscriptionTarget) {
        let subscription = match self.engine.subscribe(target).await {
            Ok(subscription) => subscription,
            Err(e) => {
                pending.reject(to_rpc_error(e)).await;
                return;
            }
        };

        let sink = match pending.accept().await {
            Ok(sink) => RpcFrameSink::new(sink),
            Err(_) => {
                debug!(%target, "Client left before the subscription was accepted");
                subscription.unsubscribe().await;
                return;
            }
        };

        self.session
            .run(subscription, &sink, self.shutdown.clone())
            .await;
    }
}
