//! Point-in-time rate resolution
//!
//! Picks the single period active at a local timestamp and works out when
//! the rate next changes. Pure and synchronous; called once per cycle.

use crate::error::{Result, TariffError};
use crate::tariff::{DayType, RateSchedule, Season, SeasonSchedule, TierLabel};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, TimeZone, Timelike};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Rate in effect at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentRate {
    /// $/kWh
    pub price: f64,
    pub tier: TierLabel,
    pub season: Season,
    /// Start of the next hour at which the rate changes, if known
    pub next_change: Option<DateTime<FixedOffset>>,
    pub plan_name: String,
    pub utility_name: String,
}

impl CurrentRate {
    fn fallback(schedule: &RateSchedule, season: Season) -> Self {
        Self {
            price: schedule.fallback_price,
            tier: schedule.fallback_tier,
            season,
            next_change: None,
            plan_name: schedule.plan_name.clone(),
            utility_name: schedule.utility_name.clone(),
        }
    }
}

/// Resolve the rate in effect at `now` (local wall-clock time)
pub fn resolve<Tz: TimeZone>(schedule: &RateSchedule, now: &DateTime<Tz>) -> Result<CurrentRate> {
    let today = now.date_naive();
    let season = Season::for_date(today);
    let day = DayType::of_date(today);
    let hour = now.hour();

    let Some(season_schedule) = schedule.season(season) else {
        warn!(%season, "No schedule found for season, using fallback");
        return Ok(CurrentRate::fallback(schedule, season));
    };

    let Some(period) = season_schedule.period_at(hour, day) else {
        warn!(
            hour,
            weekend = (day == DayType::Weekend),
            %season,
            "No rate period matched, using fallback rate"
        );
        return Ok(CurrentRate::fallback(schedule, season));
    };

    Ok(CurrentRate {
        price: period.price,
        tier: period.tier,
        season,
        next_change: next_change(season_schedule, now)?,
        plan_name: schedule.plan_name.clone(),
        utility_name: schedule.utility_name.clone(),
    })
}

/// Next boundary later today, else the first real boundary tomorrow
pub fn next_change<Tz: TimeZone>(
    season: &SeasonSchedule,
    now: &DateTime<Tz>,
) -> Result<Option<DateTime<FixedOffset>>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let day = DayType::of_date(today);

    let today_hours: BTreeSet<u32> = season
        .periods_for(day)
        .flat_map(|p| [Some(p.start_hour), (p.end_hour < 24).then_some(p.end_hour)])
        .flatten()
        .collect();
    if let Some(&h) = today_hours.range(now.hour() + 1..).next() {
        return at_local_hour(&tz, today, h).map(Some);
    }

    let Some(tomorrow) = today.succ_opt() else {
        return Ok(None);
    };
    let tomorrow_day = DayType::of_date(tomorrow);

    // Midnight only counts when the rate on either side differs, so an
    // unchanged off-peak night reports tomorrow's first real boundary.
    // A same-rate weekend rollover is therefore never reported as 00:00.
    let rollover_changes = match (season.period_at(23, day), season.period_at(0, tomorrow_day)) {
        (Some(before), Some(after)) => !before.same_rate_as(after),
        _ => true,
    };

    let first_start = season
        .periods_for(tomorrow_day)
        .map(|p| p.start_hour)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .find(|&h| h != 0 || rollover_changes);

    match first_start {
        Some(h) => at_local_hour(&tz, tomorrow, h).map(Some),
        None => Ok(None),
    }
}

/// `date` at `hour`:00 local time; a skipped (DST gap) hour moves forward
fn at_local_hour<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
) -> Result<DateTime<FixedOffset>> {
    let base = date.and_hms_opt(hour, 0, 0).ok_or_else(|| {
        TariffError::resolution(format!("Invalid boundary hour {} on {}", hour, date))
    })?;

    (0..3)
        .find_map(|shift| {
            tz.from_local_datetime(&(base + TimeDelta::hours(shift)))
                .earliest()
        })
        .map(|t| t.fixed_offset())
        .ok_or_else(|| {
            TariffError::resolution(format!("No local time exists near {} {}:00", date, hour))
        })
}
