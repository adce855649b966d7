//! JSON-RPC Server
//!
//! Serves JSON-RPC 2.0 over HTTP and WebSocket on one TCP port. Stream
//! subscriptions require WebSocket.

use crate::handler::RpcHandler;
use crate::types::{
    CallNextRequest, CounterRequest, CounterSubscribeRequest, CreateCounterRequest,
    CreateQueueTypeRequest, HistoryRequest, ListQueueTypesRequest, ListTicketsRequest,
    QueueTypeCodeRequest, ResetTodayRequest, TakeTicketRequest, UpdateCounterRequest,
    UpdateQueueTypeRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use ticketline_core::application::{QueueEngine, ShutdownToken, SubscriptionTarget};
use ticketline_core::port::IdProvider;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9530;

/// RPC Server Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        engine: Arc<QueueEngine>,
        id_provider: Arc<dyn IdProvider>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(engine, id_provider, shutdown)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the server handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.build_module().map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }

    fn build_module(&self) -> Result<RpcModule<()>, jsonrpsee::core::RegisterMethodError> {
        let mut module = RpcModule::new(());

        // Dispatch
        let handler = self.handler.clone();
        module.register_async_method("ticket.take.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: TakeTicketRequest = params.parse::<Option<_>>()?.unwrap_or_default();
                handler.take_ticket(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.call_next.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CallNextRequest = params.parse()?;
                handler.call_next(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.recall.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CounterRequest = params.parse()?;
                handler.recall(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.complete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CounterRequest = params.parse()?;
                handler.complete(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.cancel.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CounterRequest = params.parse()?;
                handler.cancel(req).await
            }
        })?;

        // Admin
        let handler = self.handler.clone();
        module.register_async_method("admin.reset_today.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: ResetTodayRequest = params.parse::<Option<_>>()?.unwrap_or_default();
                handler.reset_today(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("admin.stats.v1", move |_, _, _| {
            let handler = handler.clone();
            async move { handler.stats().await }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("admin.history.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: HistoryRequest = params.parse::<Option<_>>()?.unwrap_or_default();
                handler.history(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("ticket.list.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: ListTicketsRequest = params.parse::<Option<_>>()?.unwrap_or_default();
                handler.list_tickets(req).await
            }
        })?;

        // Catalog
        let handler = self.handler.clone();
        module.register_async_method("counter.create.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CreateCounterRequest = params.parse()?;
                handler.create_counter(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.list.v1", move |_, _, _| {
            let handler = handler.clone();
            async move { handler.list_counters().await }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.update.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: UpdateCounterRequest = params.parse()?;
                handler.update_counter(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("counter.delete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CounterRequest = params.parse()?;
                handler.delete_counter(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue_type.create.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CreateQueueTypeRequest = params.parse()?;
                handler.create_queue_type(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue_type.list.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: ListQueueTypesRequest = params.parse::<Option<_>>()?.unwrap_or_default();
                handler.list_queue_types(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue_type.update.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: UpdateQueueTypeRequest = params.parse()?;
                handler.update_queue_type(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue_type.delete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: QueueTypeCodeRequest = params.parse()?;
                handler.delete_queue_type(req).await
            }
        })?;

        // Streams
        let handler = self.handler.clone();
        module.register_subscription(
            "display.subscribe.v1",
            "display.frame",
            "display.unsubscribe.v1",
            move |_, pending, _, _| {
                let handler = handler.clone();
                async move { handler.stream(pending, SubscriptionTarget::Display).await }
            },
        )?;

        let handler = self.handler.clone();
        module.register_subscription(
            "counter.subscribe.v1",
            "counter.frame",
            "counter.unsubscribe.v1",
            move |params, pending, _, _| {
                let handler = handler.clone();
                async move {
                    match params.parse::<CounterSubscribeRequest>() {
                        Ok(req) => {
                            handler
                                .stream(pending, SubscriptionTarget::Counter(req.counter_id))
                                .await
                        }
                        Err(e) => pending.reject(e).await,
                    }
                }
            },
        )?;

        Ok(module)
    }
}
