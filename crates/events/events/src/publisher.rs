//! Registration event publisher.
//!
//! The publisher owns the distribution channel between the front door and
//! the consumers. It is started once; the start wires the consumers and
//! spawns one worker per partition. Publishing never waits on persistence,
//! only on channel admission.
//!
//! ```text
//! publish ──► hash(plugin:context) % N ──► [partition 0] ──► worker 0 ──► handlers
//!                                   └──► [partition N-1] ──► worker N-1 ──► handlers
//! ```
//!
//! The key is the selector an event writes to, so events for one selector
//! (and therefore for one application path) always land on the same
//! partition and are applied in sequence order. With a single worker the
//! order is global.
//!
//! Workers run on the runtime that called `start`. They stop when that
//! runtime shuts down, after which every publish fails with
//! [`PublishError::Closed`]; a started publisher cannot be restarted.

use rpc_register_core::{RegisterError, RegisterPayload, RegisterService, RpcType};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::{BackpressurePolicy, PublisherConfig};
use crate::consumer::{ConsumerWorker, RegisterConsumer};
use crate::error::{PublishError, PublishResult};
use crate::event::{ChangeType, RegisterEvent};
use crate::handler::RegisterEventHandler;
use crate::stats::{PublisherStats, StatsSnapshot};

static GLOBAL: OnceLock<Arc<RegisterEventPublisher>> = OnceLock::new();

/// Wiring fixed by the one successful start.
struct Running {
    senders: Vec<mpsc::Sender<RegisterEvent>>,
    handler_ids: Vec<String>,
}

impl Running {
    fn partition_for(&self, key: &str) -> usize {
        if self.senders.len() == 1 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }
}

/// Fan-in channel from registration endpoints to registration consumers.
pub struct RegisterEventPublisher {
    config: PublisherConfig,
    running: OnceLock<Running>,
    /// Last assigned sequence. Held while an admitted event is sent, so
    /// sequence order is channel order.
    sequence: Mutex<u64>,
    stats: Arc<PublisherStats>,
}

impl RegisterEventPublisher {
    /// Creates an unstarted publisher.
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            config,
            running: OnceLock::new(),
            sequence: Mutex::new(0),
            stats: Arc::new(PublisherStats::default()),
        }
    }

    /// Returns the process-wide publisher, created with the default config.
    ///
    /// The global instance lives for the whole process, but its workers are
    /// bound to the runtime of the first `start`. Start it from the runtime
    /// that serves traffic, never from a short-lived one such as a test
    /// runtime: once that runtime is dropped, publishing fails with
    /// [`PublishError::Closed`] for good.
    pub fn global() -> Arc<Self> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::new(PublisherConfig::default())))
            .clone()
    }

    /// Installs a configured process-wide publisher.
    ///
    /// Returns the instance actually installed: if `global` was already
    /// initialized, the existing publisher wins and `config` is ignored.
    pub fn init_global(config: PublisherConfig) -> Arc<Self> {
        GLOBAL.get_or_init(|| Arc::new(Self::new(config))).clone()
    }

    /// Starts the publisher with a consumer writing through `service`.
    ///
    /// Only the first call wires anything and returns `true`; every later
    /// or concurrent call returns `false` and drops its arguments. Racing
    /// callers block until the winner has finished wiring, so a `false`
    /// return always means the publisher is ready.
    ///
    /// Consumer workers are spawned on the caller's Tokio runtime and live
    /// as long as it does.
    pub fn start(&self, service: Arc<dyn RegisterService>) -> PublishResult<bool> {
        if self.is_started() {
            return Ok(false);
        }
        let consumer: Arc<dyn RegisterEventHandler> = Arc::new(RegisterConsumer::new(service));
        self.start_with_handlers(vec![consumer])
    }

    /// Starts the publisher with explicit handlers, run in the given order.
    pub fn start_with_handlers(&self, handlers: Vec<Arc<dyn RegisterEventHandler>>) -> PublishResult<bool> {
        if self.is_started() {
            return Ok(false);
        }
        let runtime = Handle::try_current().map_err(|_| PublishError::NoRuntime)?;

        let mut wired = false;
        let running = self.running.get_or_init(|| {
            wired = true;
            self.spawn_workers(&runtime, handlers)
        });

        if wired {
            tracing::info!(
                workers = running.senders.len(),
                capacity = self.config.capacity,
                handlers = ?running.handler_ids,
                "Registration publisher started"
            );
        }
        Ok(wired)
    }

    fn spawn_workers(&self, runtime: &Handle, handlers: Vec<Arc<dyn RegisterEventHandler>>) -> Running {
        let worker_count = self.config.worker_count.max(1);
        let capacity = self.config.capacity.max(1);
        let handler_ids = handlers.iter().map(|h| h.id().to_string()).collect();
        let handlers: Arc<[Arc<dyn RegisterEventHandler>]> = handlers.into();

        let mut senders = Vec::with_capacity(worker_count);
        for partition in 0..worker_count {
            let (tx, rx) = mpsc::channel(capacity);
            let worker = ConsumerWorker {
                partition,
                rx,
                handlers: Arc::clone(&handlers),
                stats: Arc::clone(&self.stats),
                consume_timeout: self.config.consume_timeout,
            };
            runtime.spawn(worker.run());
            senders.push(tx);
        }

        Running {
            senders,
            handler_ids,
        }
    }

    /// Returns true once `start` has completed.
    pub fn is_started(&self) -> bool {
        self.running.get().is_some()
    }

    /// Number of consumer partitions, or 0 before start.
    pub fn partitions(&self) -> usize {
        self.running.get().map(|r| r.senders.len()).unwrap_or(0)
    }

    /// Returns the publisher configuration.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Returns a snapshot of the pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Builds an event and admits it into its partition channel.
    ///
    /// Returns the sequence number once the event is admitted. Sequence
    /// numbers are contiguous across admitted events and follow the order in
    /// which events entered their channel; rejected calls consume none.
    /// Admission means "accepted for processing": persistence happens later
    /// on a consumer worker and its outcome is not reported back.
    pub async fn publish(
        &self,
        change_type: ChangeType,
        rpc_type: RpcType,
        payload: RegisterPayload,
    ) -> PublishResult<u64> {
        if payload.rpc_type() != rpc_type {
            return Err(RegisterError::RpcTypeMismatch {
                expected: rpc_type,
                actual: payload.rpc_type(),
            }
            .into());
        }

        let Some(running) = self.running.get() else {
            self.stats.record_rejected();
            return Err(PublishError::Uninitialized);
        };

        let partition = running.partition_for(&payload.partition_key());
        let sender = &running.senders[partition];

        let permit = match self.config.backpressure {
            BackpressurePolicy::BoundedWait { timeout } => {
                match tokio::time::timeout(timeout, sender.reserve()).await {
                    Ok(Ok(permit)) => Ok(permit),
                    Ok(Err(_)) => Err(PublishError::Closed),
                    Err(_) => Err(PublishError::AdmissionTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                }
            }
            BackpressurePolicy::FailFast => sender.try_reserve().map_err(|e| match e {
                TrySendError::Full(()) => PublishError::ChannelFull,
                TrySendError::Closed(()) => PublishError::Closed,
            }),
        };

        let permit = match permit {
            Ok(permit) => permit,
            Err(e) => {
                self.stats.record_rejected();
                tracing::warn!(
                    rpc_type = %rpc_type,
                    path = %payload.path(),
                    partition,
                    error = %e,
                    "Registration event rejected"
                );
                return Err(e);
            }
        };

        // Only admitted events consume a sequence number.
        let (event_id, sequence) = {
            let mut last = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
            *last += 1;
            let event = RegisterEvent::new(change_type, payload).with_sequence(*last);
            let event_id = event.id().to_string();
            self.stats.record_published();
            permit.send(event);
            (event_id, *last)
        };

        tracing::debug!(
            event_id = %event_id,
            sequence,
            change_type = %change_type,
            rpc_type = %rpc_type,
            partition,
            "Registration event published"
        );
        Ok(sequence)
    }
}

impl Default for RegisterEventPublisher {
    fn default() -> Self {
        Self::new(PublisherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rpc_register_core::{
        MetaDataRegister, RegisterResult, SpringCloudRegister, SpringMvcRegister,
    };
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc::UnboundedReceiver, mpsc::UnboundedSender};

    /// Records (service id, method, path) for every call.
    struct RecordingService {
        id: usize,
        tx: UnboundedSender<(usize, &'static str, String)>,
        fail_path: Option<String>,
    }

    impl RecordingService {
        fn new(id: usize) -> (Arc<Self>, UnboundedReceiver<(usize, &'static str, String)>) {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (Arc::new(Self { id, tx, fail_path: None }), rx)
        }

        fn record(&self, method: &'static str, path: &str) -> RegisterResult<()> {
            if self.fail_path.as_deref() == Some(path) {
                return Err(RegisterError::storage("database unavailable"));
            }
            let _ = self.tx.send((self.id, method, path.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl RegisterService for RecordingService {
        async fn register_spring_mvc(&self, r: &SpringMvcRegister) -> RegisterResult<()> {
            self.record("spring_mvc", &r.path)
        }
        async fn register_spring_cloud(&self, r: &SpringCloudRegister) -> RegisterResult<()> {
            self.record("spring_cloud", &r.path)
        }
        async fn register_dubbo(&self, r: &MetaDataRegister) -> RegisterResult<()> {
            self.record("dubbo", &r.path)
        }
        async fn register_sofa(&self, r: &MetaDataRegister) -> RegisterResult<()> {
            self.record("sofa", &r.path)
        }
        async fn register_tars(&self, r: &MetaDataRegister) -> RegisterResult<()> {
            self.record("tars", &r.path)
        }
        async fn register_grpc(&self, r: &MetaDataRegister) -> RegisterResult<()> {
            self.record("grpc", &r.path)
        }
        async fn unregister(&self, p: &RegisterPayload) -> RegisterResult<()> {
            self.record("unregister", p.path())
        }
    }

    /// Blocks inside `handle` until released.
    struct BlockingHandler {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl RegisterEventHandler for BlockingHandler {
        fn id(&self) -> &str {
            "blocking"
        }

        async fn handle(&self, _event: &RegisterEvent) -> RegisterResult<()> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    fn cloud(app: &str, path: &str) -> RegisterPayload {
        RegisterPayload::SpringCloud(SpringCloudRegister {
            app_name: app.into(),
            context_path: format!("/{}", app),
            path: path.into(),
            path_desc: String::new(),
            rule_name: path.into(),
            enabled: true,
        })
    }

    fn mvc(app: &str, path: &str) -> RegisterPayload {
        RegisterPayload::SpringMvc(SpringMvcRegister {
            app_name: app.into(),
            context_path: format!("/{}", app),
            path: path.into(),
            path_desc: String::new(),
            host: "127.0.0.1".into(),
            port: 8080,
            rule_name: path.into(),
            enabled: true,
            register_meta_data: false,
        })
    }

    fn rpc(rpc_type: RpcType, path: &str) -> RegisterPayload {
        RegisterPayload::MetaData(MetaDataRegister {
            app_name: "order-service".into(),
            context_path: "/order".into(),
            path: path.into(),
            path_desc: String::new(),
            rpc_type,
            service_name: "OrderService".into(),
            method_name: "GetOrder".into(),
            rule_name: path.into(),
            parameter_types: None,
            rpc_ext: None,
            enabled: true,
            host: Some("127.0.0.1".into()),
            port: Some(9090),
        })
    }

    async fn recv(rx: &mut UnboundedReceiver<(usize, &'static str, String)>) -> (usize, &'static str, String) {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("consumer did not deliver in time")
            .expect("channel closed")
    }

    async fn wait_idle(publisher: &RegisterEventPublisher) {
        for _ in 0..200 {
            if publisher.stats().in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("publisher did not drain: {:?}", publisher.stats());
    }

    #[tokio::test]
    async fn test_publish_before_start_fails() {
        let publisher = RegisterEventPublisher::default();

        let err = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("order-service", "/order/list"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Uninitialized));
        assert_eq!(publisher.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_mismatched_tag_rejected() {
        let publisher = RegisterEventPublisher::default();
        let (service, _rx) = RecordingService::new(0);
        publisher.start(service).unwrap();

        let err = publisher
            .publish(ChangeType::Register, RpcType::Http, rpc(RpcType::Grpc, "/order/get"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Invalid(RegisterError::RpcTypeMismatch { .. })));
        assert!(!err.is_admission());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let publisher = RegisterEventPublisher::default();
        let (first, mut first_rx) = RecordingService::new(1);
        let (second, mut second_rx) = RecordingService::new(2);

        assert!(publisher.start(first).unwrap());
        assert!(!publisher.start(second).unwrap());
        assert_eq!(publisher.partitions(), 1);

        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("order-service", "/order/list"))
            .await
            .unwrap();

        let (id, method, path) = recv(&mut first_rx).await;
        assert_eq!((id, method, path.as_str()), (1, "spring_mvc", "/order/list"));
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_wires_once() {
        let publisher = Arc::new(RegisterEventPublisher::new(PublisherConfig::new().worker_count(3)));
        let mut receivers = Vec::new();
        let mut tasks = Vec::new();

        for id in 0..16 {
            let (service, rx) = RecordingService::new(id);
            receivers.push(rx);
            let publisher = Arc::clone(&publisher);
            tasks.push(tokio::spawn(async move { publisher.start(service).unwrap() }));
        }

        let mut wired = 0;
        for task in tasks {
            if task.await.unwrap() {
                wired += 1;
            }
        }
        assert_eq!(wired, 1);
        assert_eq!(publisher.partitions(), 3);

        publisher
            .publish(ChangeType::Register, RpcType::SpringCloud, cloud("cloud", "/cloud/a"))
            .await
            .unwrap();

        // Exactly one of the racing services received the event.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let delivered: usize = receivers
            .iter_mut()
            .map(|rx| std::iter::from_fn(|| rx.try_recv().ok()).count())
            .sum();
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_fifo_delivery() {
        let publisher = RegisterEventPublisher::default();
        let (service, mut rx) = RecordingService::new(0);
        publisher.start(service).unwrap();

        for i in 0..100 {
            // Alternate keys and dialects; a single partition keeps global order.
            let payload = if i % 2 == 0 {
                cloud("cloud", &format!("/cloud/{}", i))
            } else {
                mvc("order-service", &format!("/order/{}", i))
            };
            let rpc_type = payload.rpc_type();
            let sequence = publisher
                .publish(ChangeType::Register, rpc_type, payload)
                .await
                .unwrap();
            assert_eq!(sequence, i + 1);
        }

        for i in 0..100 {
            let (_, _, path) = recv(&mut rx).await;
            assert!(path.ends_with(&format!("/{}", i)), "event {} delivered out of order: {}", i, path);
        }
    }

    #[tokio::test]
    async fn test_per_key_order_across_partitions() {
        let publisher = RegisterEventPublisher::new(PublisherConfig::new().worker_count(4));
        let (service, mut rx) = RecordingService::new(0);
        publisher.start(service).unwrap();

        let keys = ["/a", "/b", "/c", "/d", "/e"];
        for round in 0..20 {
            for key in keys {
                let change_type = if round % 2 == 0 { ChangeType::Register } else { ChangeType::Delete };
                publisher
                    .publish(change_type, RpcType::SpringCloud, cloud(&format!("app{}", &key[1..]), key))
                    .await
                    .unwrap();
            }
        }

        let mut seen: std::collections::HashMap<String, Vec<&'static str>> = Default::default();
        for _ in 0..(20 * keys.len()) {
            let (_, method, path) = recv(&mut rx).await;
            seen.entry(path).or_default().push(method);
        }

        for key in keys {
            let methods = &seen[key];
            assert_eq!(methods.len(), 20);
            for (round, method) in methods.iter().enumerate() {
                let expected = if round % 2 == 0 { "spring_cloud" } else { "unregister" };
                assert_eq!(*method, expected, "key {} round {}", key, round);
            }
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stall_consumer() {
        let publisher = RegisterEventPublisher::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let service = Arc::new(RecordingService {
            id: 0,
            tx,
            fail_path: Some("/order/bad".into()),
        });
        publisher.start(service).unwrap();

        for path in ["/order/1", "/order/bad", "/order/2"] {
            publisher
                .publish(ChangeType::Register, RpcType::Http, mvc("order-service", path))
                .await
                .unwrap();
        }

        assert_eq!(recv(&mut rx).await.2, "/order/1");
        assert_eq!(recv(&mut rx).await.2, "/order/2");
        wait_idle(&publisher).await;

        let stats = publisher.stats();
        assert_eq!(stats.published, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed, 2);
    }

    #[tokio::test]
    async fn test_hung_handler_hits_deadline() {
        let publisher = RegisterEventPublisher::new(
            PublisherConfig::new().consume_timeout(Duration::from_millis(50)),
        );
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (service, mut rx) = RecordingService::new(0);
        let handlers: Vec<Arc<dyn RegisterEventHandler>> = vec![
            Arc::new(BlockingHandler {
                entered: entered.clone(),
                release: release.clone(),
            }),
            Arc::new(RegisterConsumer::new(service)),
        ];
        publisher.start_with_handlers(handlers).unwrap();

        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("order-service", "/order/list"))
            .await
            .unwrap();

        // The blocking handler never returns; the consumer still runs.
        assert_eq!(recv(&mut rx).await.2, "/order/list");
        wait_idle(&publisher).await;
        let stats = publisher.stats();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_full_channel_times_out() {
        let publisher = RegisterEventPublisher::new(
            PublisherConfig::new()
                .capacity(1)
                .admission_timeout(Duration::from_millis(50)),
        );
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let blocking: Arc<dyn RegisterEventHandler> = Arc::new(BlockingHandler {
            entered: entered.clone(),
            release: release.clone(),
        });
        publisher.start_with_handlers(vec![blocking]).unwrap();

        // First event occupies the worker, second fills the channel.
        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/1"))
            .await
            .unwrap();
        entered.notified().await;
        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/2"))
            .await
            .unwrap();

        let err = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::AdmissionTimeout { timeout_ms: 50 }));
        assert!(err.is_admission());

        let stats = publisher.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.rejected, 1);
        release.notify_one();
    }

    #[tokio::test]
    async fn test_fail_fast_policy() {
        let publisher = RegisterEventPublisher::new(
            PublisherConfig::new()
                .capacity(1)
                .backpressure(BackpressurePolicy::FailFast),
        );
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let blocking: Arc<dyn RegisterEventHandler> = Arc::new(BlockingHandler {
            entered: entered.clone(),
            release: release.clone(),
        });
        publisher.start_with_handlers(vec![blocking]).unwrap();

        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/1"))
            .await
            .unwrap();
        entered.notified().await;
        publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/2"))
            .await
            .unwrap();

        let err = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::ChannelFull));
        release.notify_one();
    }

    #[tokio::test]
    async fn test_rejected_publish_consumes_no_sequence() {
        let publisher = RegisterEventPublisher::new(
            PublisherConfig::new()
                .capacity(1)
                .backpressure(BackpressurePolicy::FailFast),
        );
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let blocking: Arc<dyn RegisterEventHandler> = Arc::new(BlockingHandler {
            entered: entered.clone(),
            release: release.clone(),
        });
        publisher.start_with_handlers(vec![blocking]).unwrap();

        let first = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/1"))
            .await
            .unwrap();
        entered.notified().await;
        let second = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/2"))
            .await
            .unwrap();
        assert!(publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/3"))
            .await
            .is_err());

        // Let the worker move on to the second event, freeing the slot.
        release.notify_one();
        entered.notified().await;
        let third = publisher
            .publish(ChangeType::Register, RpcType::Http, mvc("a", "/a/4"))
            .await
            .unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
        release.notify_one();
    }

    #[tokio::test]
    async fn test_grpc_routes_to_grpc_branch() {
        let publisher = RegisterEventPublisher::default();
        let (service, mut rx) = RecordingService::new(0);
        publisher.start(service).unwrap();

        publisher
            .publish(ChangeType::Register, RpcType::Grpc, rpc(RpcType::Grpc, "/order/getOrder"))
            .await
            .unwrap();

        let (_, method, path) = recv(&mut rx).await;
        assert_eq!(method, "grpc");
        assert_eq!(path, "/order/getOrder");
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let publisher = RegisterEventPublisher::default();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let service = Arc::new(RecordingService { id: 0, tx, fail_path: None });

        assert!(matches!(publisher.start(service), Err(PublishError::NoRuntime)));
        assert!(!publisher.is_started());
    }

    #[test]
    fn test_publish_after_runtime_shutdown_is_closed() {
        let publisher = RegisterEventPublisher::default();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let service = Arc::new(RecordingService { id: 0, tx, fail_path: None });

        let first = tokio::runtime::Runtime::new().unwrap();
        assert!(first.block_on(async { publisher.start(service) }).unwrap());
        drop(first);

        let second = tokio::runtime::Runtime::new().unwrap();
        let err = second
            .block_on(publisher.publish(
                ChangeType::Register,
                RpcType::Http,
                mvc("order-service", "/order/list"),
            ))
            .unwrap_err();

        assert!(matches!(err, PublishError::Closed));
        assert!(publisher.is_started());
        assert_eq!(publisher.stats().rejected, 1);
    }
}
