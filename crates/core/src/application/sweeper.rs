// Stale Ticket Sweeper - periodically cancels tickets nobody called

use crate::application::constants::{DEFAULT_STALE_TICKET_AGE, DEFAULT_SWEEP_INTERVAL};
use crate::application::engine::QueueEngine;
use crate::application::shutdown::ShutdownToken;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub interval_secs: u64,
    /// Waiting tickets older than this are cancelled; 0 disables the sweeper
    pub max_age_hours: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            max_age_hours: DEFAULT_STALE_TICKET_AGE.as_secs() / 3600,
        }
    }
}

impl SweepConfig {
    pub fn enabled(&self) -> bool {
        self.max_age_hours > 0 && self.interval_secs > 0
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours.saturating_mul(3600))
    }
}

/// Background sweeper
pub struct StaleTicketSweeper {
    engine: Arc<QueueEngine>,
    config: SweepConfig,
}

impl StaleTicketSweeper {
    pub fn new(engine: Arc<QueueEngine>, config: SweepConfig) -> Self {
        Self { engine, config }
    }

    /// Run the sweep loop (spawn with `tokio::spawn`)
    ///
    /// The first sweep happens one interval after start.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        if !self.config.enabled() {
            info!("Stale ticket sweeper disabled");
            return;
        }

        info!(
            interval_secs = self.config.interval_secs,
            max_age_hours = self.config.max_age_hours,
            "Stale ticket sweeper started"
        );

        let period = self.config.interval();
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.wait() => break,
            }

            self.sweep_once().await;
        }

        info!("Stale ticket sweeper stopped");
    }

    /// One sweep; failures are logged and never stop the loop
    pub async fn sweep_once(&self) -> u64 {
        match self.engine.auto_cancel_stale(self.config.max_age()).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                error!(error = ?e, "Stale ticket sweep failed");
                0
            }
        }
    }
}
