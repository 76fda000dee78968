//! Refresh orchestration
//!
//! Holds the cached [`RateSchedule`] and decides, at the start of every
//! cycle, whether it is due for a re-fetch. Fetch failures fall back to the
//! last good schedule; with nothing cached the cycle fails as unavailable.

use crate::config::{Config, GasConfig, GasUnit, PlanConfig};
use crate::error::{Result, TariffError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::openei::TariffSource;
use crate::resolver::{CurrentRate, resolve};
use crate::tariff::{RateSchedule, Season, TierLabel, parse};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

/// Fractional digits kept in published prices
const PRICE_DECIMALS: i32 = 5;

/// Ten years
const MAX_FETCH_INTERVAL_HOURS: u64 = 24 * 3650;

/// Outbound record produced by each successful cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// $/kWh
    pub current_rate: f64,
    pub tier: TierLabel,
    pub season: Season,
    pub next_change: Option<DateTime<FixedOffset>>,
    pub utility_name: String,
    pub rate_plan_name: String,
    pub last_api_fetch: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_unit: Option<GasUnit>,
}

/// Latest cycle outcome as published to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RateStatus {
    /// No cycle has completed yet
    Starting,
    Available(RateSnapshot),
    Unavailable {
        reason: String,
        last_fetch: Option<DateTime<FixedOffset>>,
    },
}

impl RateStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Round to the published price precision
pub fn round_price(price: f64) -> f64 {
    let scale = 10f64.powi(PRICE_DECIMALS);
    (price * scale).round() / scale
}

/// Owns the cached schedule and the staleness clock
pub struct RateCoordinator {
    source: Box<dyn TariffSource>,
    plan: PlanConfig,
    gas: Option<GasConfig>,
    fetch_interval: TimeDelta,
    schedule: Option<RateSchedule>,
    last_fetch: Option<DateTime<FixedOffset>>,
    logger: StructuredLogger,
}

impl RateCoordinator {
    pub fn new(source: Box<dyn TariffSource>, config: &Config) -> Self {
        let hours = config.refresh.fetch_interval_hours.min(MAX_FETCH_INTERVAL_HOURS) as i64;
        let logger = get_logger_with_context(
            LogContext::new("refresh").with_plan_label(&config.plan.rate_plan_id),
        );
        Self {
            source,
            plan: config.plan.clone(),
            gas: config.gas.clone(),
            fetch_interval: TimeDelta::hours(hours),
            schedule: None,
            last_fetch: None,
            logger,
        }
    }

    pub fn schedule(&self) -> Option<&RateSchedule> {
        self.schedule.as_ref()
    }

    /// Time of the last successful fetch
    pub fn last_fetch(&self) -> Option<DateTime<FixedOffset>> {
        self.last_fetch
    }

    /// Whether the schedule must be (re-)fetched before resolving at `now`
    pub fn needs_fetch<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        if self.schedule.is_none() {
            return true;
        }
        match self.last_fetch {
            None => true,
            Some(last) => now.clone().signed_duration_since(last) >= self.fetch_interval,
        }
    }

    /// Run one cycle: fetch when due, then resolve against the cached schedule
    pub async fn update(&mut self, now: DateTime<chrono_tz::Tz>) -> Result<RateSnapshot> {
        if self.needs_fetch(&now) {
            match self.fetch().await {
                Ok(schedule) => {
                    self.schedule = Some(schedule);
                    self.last_fetch = Some(now.fixed_offset());
                }
                Err(e) if self.schedule.is_some() => {
                    self.logger.warn(&format!(
                        "Failed to refresh rate schedule, using cached data: {}",
                        e
                    ));
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Unable to fetch rate data: {}", e));
                    return Err(TariffError::unavailable(format!(
                        "no rate schedule has been fetched yet: {}",
                        e
                    )));
                }
            }
        }

        let schedule = self
            .schedule
            .as_ref()
            .ok_or_else(|| TariffError::unavailable("no rate schedule cached"))?;
        let rate = resolve(schedule, &now)?;
        Ok(self.snapshot(rate))
    }

    async fn fetch(&self) -> Result<RateSchedule> {
        self.logger.info("Fetching rate schedule from OpenEI");
        let raw = self.source.fetch_tariff(&self.plan.rate_plan_id).await?;
        let schedule = parse(&raw);
        self.logger.info(&format!(
            "Rate schedule updated: {} ({} seasons)",
            schedule.plan_name,
            schedule.seasons.len()
        ));
        Ok(schedule)
    }

    fn snapshot(&self, rate: CurrentRate) -> RateSnapshot {
        let configured = |s: &str, parsed: String| {
            if s.trim().is_empty() { parsed } else { s.to_string() }
        };
        RateSnapshot {
            current_rate: round_price(rate.price),
            tier: rate.tier,
            season: rate.season,
            next_change: rate.next_change,
            utility_name: configured(&self.plan.utility_name, rate.utility_name),
            rate_plan_name: configured(&self.plan.rate_plan_name, rate.plan_name),
            last_api_fetch: self.last_fetch,
            gas_rate: self.gas.as_ref().map(|g| g.rate),
            gas_unit: self.gas.as_ref().map(|g| g.unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(0.123456789), 0.12346);
        assert_eq!(round_price(0.45), 0.45);
        assert_eq!(round_price(0.0), 0.0);
    }

    #[test]
    fn test_status_serialization() {
        let starting = serde_json::to_value(RateStatus::Starting).unwrap();
        assert_eq!(starting["status"], "starting");

        let unavailable = serde_json::to_value(RateStatus::Unavailable {
            reason: "boom".to_string(),
            last_fetch: None,
        })
        .unwrap();
        assert_eq!(unavailable["status"], "unavailable");
        assert_eq!(unavailable["reason"], "boom");
        assert!(unavailable["last_fetch"].is_null());
    }

    #[test]
    fn test_snapshot_omits_gas_when_unset() {
        let snapshot = RateSnapshot {
            current_rate: 0.25,
            tier: TierLabel::OffPeak,
            season: Season::Winter,
            next_change: None,
            utility_name: "U".to_string(),
            rate_plan_name: "P".to_string(),
            last_api_fetch: None,
            gas_rate: None,
            gas_unit: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("gas_rate").is_none());
        assert_eq!(json["tier"], "off_peak");
        assert!(json["next_change"].is_null());
    }
}
