//! Shared wiring for the end-to-end tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use ticketline_core::application::{
    shutdown_channel, HubConfig, NotificationHub, QueueEngine, SequencerConfig, ShutdownSender,
};
use ticketline_core::domain::CounterId;
use ticketline_core::port::time_provider::mocks::FixedTimeProvider;
use ticketline_core::port::time_provider::{local_day_start, SystemTimeProvider};
use ticketline_core::port::TimeProvider;
use ticketline_infra_sqlite::{create_pool, run_migrations, SqliteQueueStore};

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Engine over a real SQLite store with a hand-driven clock
pub struct TestEngine {
    pub engine: Arc<QueueEngine>,
    pub clock: Arc<FixedTimeProvider>,
    pub store: Arc<SqliteQueueStore>,
    pub hub_stop: ShutdownSender,
    _db: Option<TempDb>,
}

impl TestEngine {
    pub async fn in_memory() -> Self {
        Self::build("sqlite::memory:", None, SequencerConfig::default()).await
    }

    pub async fn in_memory_with(config: SequencerConfig) -> Self {
        Self::build("sqlite::memory:", None, config).await
    }

    /// File-backed store so several pool connections race for the write lock
    pub async fn on_disk() -> Self {
        let db = TempDb::new();
        let url = db.url();
        Self::build(&url, Some(db), SequencerConfig::default()).await
    }

    async fn build(url: &str, db: Option<TempDb>, config: SequencerConfig) -> Self {
        let pool = create_pool(url, 8).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let store = Arc::new(SqliteQueueStore::new(pool));
        let clock = Arc::new(FixedTimeProvider::new(midday_today()));
        let (hub_stop, hub_token) = shutdown_channel();
        let (hub, _handle) = NotificationHub::spawn(HubConfig::default(), hub_token);

        let engine = Arc::new(QueueEngine::new(
            store.clone(),
            Arc::new(hub),
            clock.clone(),
            config,
        ));

        Self {
            engine,
            clock,
            store,
            hub_stop,
            _db: db,
        }
    }

    pub async fn counter(&self, number: &str) -> CounterId {
        self.engine.create_counter(number, "").await.unwrap().id
    }

    pub async fn take(&self, count: usize) -> Vec<String> {
        let mut numbers = Vec::with_capacity(count);
        for _ in 0..count {
            numbers.push(self.engine.take_ticket(None).await.unwrap().number);
        }
        numbers
    }
}

/// Noon of the current local day, far from any midnight rollover
pub fn midday_today() -> i64 {
    local_day_start(SystemTimeProvider.now_millis()) + 12 * HOUR_MS
}

/// Temp database file removed on drop
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("ticketline-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = self.path.clone().into_os_string();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(sidecar);
        }
    }
}
