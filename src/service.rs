//! Minute-cadence rate service
//!
//! Drives [`RateCoordinator`] on a fixed interval and publishes each outcome
//! as a [`RateStatus`] on a watch channel.

use crate::config::Config;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::refresh::{RateCoordinator, RateStatus};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, MissedTickBehavior, interval};

pub struct RateService {
    coordinator: RateCoordinator,
    timezone: chrono_tz::Tz,
    update_interval: Duration,
    status: watch::Sender<RateStatus>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    logger: StructuredLogger,
}

impl RateService {
    pub fn new(coordinator: RateCoordinator, config: &Config) -> Result<Self> {
        let (status, _) = watch::channel(RateStatus::Starting);
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        Ok(Self {
            coordinator,
            timezone: config.tz()?,
            update_interval: Duration::from_secs(config.refresh.update_interval_seconds.max(1)),
            status,
            shutdown_tx,
            shutdown_rx,
            logger: get_logger("service"),
        })
    }

    /// Receiver that always holds the latest published status
    pub fn subscribe(&self) -> watch::Receiver<RateStatus> {
        self.status.subscribe()
    }

    /// Sender that stops [`run`](Self::run) after the current cycle
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    pub fn coordinator(&self) -> &RateCoordinator {
        &self.coordinator
    }

    /// One cycle at `now`; the outcome is published and returned
    pub async fn cycle(&mut self, now: DateTime<Utc>) -> RateStatus {
        let local = now.with_timezone(&self.timezone);
        let status = match self.coordinator.update(local).await {
            Ok(snapshot) => {
                self.logger.debug(&format!(
                    "Current rate {} ({}, {})",
                    snapshot.current_rate, snapshot.tier, snapshot.season
                ));
                RateStatus::Available(snapshot)
            }
            Err(e) => {
                self.logger.error(&format!("Rate cycle failed: {}", e));
                RateStatus::Unavailable {
                    reason: e.to_string(),
                    last_fetch: self.coordinator.last_fetch(),
                }
            }
        };
        self.status.send_replace(status.clone());
        status
    }

    /// Run cycles until a shutdown request arrives
    pub async fn run(&mut self) -> Result<()> {
        let mut ticker = interval(self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.logger.info(&format!(
            "Rate service started (every {}s)",
            self.update_interval.as_secs()
        ));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle(Utc::now()).await;
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.logger.info("Rate service stopped");
        Ok(())
    }
}
