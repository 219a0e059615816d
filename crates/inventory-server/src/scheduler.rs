//! Periodic refresh trigger

use inventory_lib::{
    health::{components, HealthRegistry},
    RefreshAck, RefreshCoordinator,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Calls `trigger_refresh` on a fixed interval until shut down
pub struct RefreshScheduler {
    coordinator: Arc<RefreshCoordinator>,
    health_registry: HealthRegistry,
    interval: Duration,
    refresh_on_startup: bool,
}

impl RefreshScheduler {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        health_registry: HealthRegistry,
        interval: Duration,
        refresh_on_startup: bool,
    ) -> Self {
        Self {
            coordinator,
            health_registry,
            interval,
            refresh_on_startup,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            refresh_on_startup = self.refresh_on_startup,
            "Starting refresh scheduler"
        );
        self.health_registry.set_healthy(components::SCHEDULER).await;

        let first = if self.refresh_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = interval_at(first, self.interval);
        // a refresh slower than the interval must not cause a burst of ticks
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.coordinator.trigger_refresh() {
                        RefreshAck::Started => debug!("Scheduled refresh started"),
                        RefreshAck::AlreadyInProgress => {
                            debug!("Scheduled refresh skipped, previous one still running")
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down refresh scheduler");
                    break;
                }
            }
        }

        self.health_registry
            .set_degraded(components::SCHEDULER, "scheduler stopped")
            .await;
    }
}
