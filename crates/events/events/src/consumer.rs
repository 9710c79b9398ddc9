//! Registration consumer.
//!
//! [`RegisterConsumer`] maps each event onto the persistence call for its
//! dialect. [`ConsumerWorker`] drains one partition channel and runs every
//! handler on each event under a deadline and a panic guard, so a failing
//! or hung event never stalls the events behind it.

use async_trait::async_trait;
use futures::FutureExt;
use rpc_register_core::{RegisterError, RegisterPayload, RegisterResult, RegisterService, RpcType};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::event::{ChangeType, RegisterEvent};
use crate::handler::RegisterEventHandler;
use crate::stats::PublisherStats;

/// Handler that applies events through a [`RegisterService`].
pub struct RegisterConsumer {
    service: Arc<dyn RegisterService>,
}

impl RegisterConsumer {
    /// Creates a consumer writing through `service`.
    pub fn new(service: Arc<dyn RegisterService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RegisterEventHandler for RegisterConsumer {
    fn id(&self) -> &str {
        "register-service"
    }

    async fn handle(&self, event: &RegisterEvent) -> RegisterResult<()> {
        let service = self.service.as_ref();

        if event.change_type() == ChangeType::Delete {
            return service.unregister(event.payload()).await;
        }

        match event.payload() {
            RegisterPayload::SpringMvc(record) => service.register_spring_mvc(record).await,
            RegisterPayload::SpringCloud(record) => service.register_spring_cloud(record).await,
            RegisterPayload::MetaData(record) => match record.rpc_type {
                RpcType::Dubbo => service.register_dubbo(record).await,
                RpcType::Sofa => service.register_sofa(record).await,
                RpcType::Tars => service.register_tars(record).await,
                RpcType::Grpc => service.register_grpc(record).await,
                RpcType::Http | RpcType::SpringCloud => Err(RegisterError::RpcTypeMismatch {
                    expected: RpcType::Dubbo,
                    actual: record.rpc_type,
                }),
            },
        }
    }
}

/// Drains one partition channel.
pub(crate) struct ConsumerWorker {
    pub(crate) partition: usize,
    pub(crate) rx: mpsc::Receiver<RegisterEvent>,
    pub(crate) handlers: Arc<[Arc<dyn RegisterEventHandler>]>,
    pub(crate) stats: Arc<PublisherStats>,
    pub(crate) consume_timeout: Duration,
}

impl ConsumerWorker {
    /// Runs until every sender of the partition is dropped.
    pub(crate) async fn run(mut self) {
        tracing::debug!(partition = self.partition, "Registration consumer started");

        while let Some(event) = self.rx.recv().await {
            if self.process(&event).await {
                self.stats.record_processed();
            } else {
                self.stats.record_failed();
            }
        }

        tracing::debug!(partition = self.partition, "Registration consumer stopped");
    }

    /// Applies one event with every handler. Returns false if any handler failed.
    async fn process(&self, event: &RegisterEvent) -> bool {
        let mut ok = true;

        for handler in self.handlers.iter() {
            let guarded = AssertUnwindSafe(handler.handle(event)).catch_unwind();

            match tokio::time::timeout(self.consume_timeout, guarded).await {
                Ok(Ok(Ok(()))) => {
                    tracing::debug!(
                        event_id = %event.id(),
                        sequence = event.sequence(),
                        handler = handler.id(),
                        "Registration event applied"
                    );
                }
                Ok(Ok(Err(e))) if e.is_validation() => {
                    ok = false;
                    tracing::warn!(
                        event_id = %event.id(),
                        rpc_type = %event.rpc_type(),
                        path = %event.payload().path(),
                        handler = handler.id(),
                        error = %e,
                        "Registration event rejected"
                    );
                }
                Ok(Ok(Err(e))) => {
                    ok = false;
                    tracing::error!(
                        event_id = %event.id(),
                        change_type = %event.change_type(),
                        rpc_type = %event.rpc_type(),
                        path = %event.payload().path(),
                        handler = handler.id(),
                        error = %e,
                        "Registration event failed"
                    );
                }
                Ok(Err(panic)) => {
                    ok = false;
                    tracing::error!(
                        event_id = %event.id(),
                        rpc_type = %event.rpc_type(),
                        handler = handler.id(),
                        panic = %panic_message(panic.as_ref()),
                        "Registration handler panicked"
                    );
                }
                Err(_) => {
                    ok = false;
                    self.stats.record_timed_out();
                    tracing::warn!(
                        event_id = %event.id(),
                        rpc_type = %event.rpc_type(),
                        handler = handler.id(),
                        timeout_ms = self.consume_timeout.as_millis() as u64,
                        "Registration event timed out"
                    );
                }
            }
        }

        ok
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
