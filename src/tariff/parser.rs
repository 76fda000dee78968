//! OpenEI tariff document → [`RateSchedule`]
//!
//! The document carries `energyratestructure` (per-period tier list) plus
//! `energyweekdayschedule` / `energyweekendschedule`, two 12×24 matrices
//! mapping each month and hour to a period index.

use super::{DayFilter, RatePeriod, RateSchedule, Season, SeasonSchedule, TierLabel, classify};
use crate::openei::RawTariff;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const HOURS_PER_DAY: usize = 24;

/// Parse a raw tariff document. Never fails: missing or malformed structure
/// degrades to a flat rate, or to a schedule with no seasons at all.
pub fn parse(raw: &RawTariff) -> RateSchedule {
    let plan_name = raw
        .text("name")
        .or_else(|| raw.text("label"))
        .unwrap_or_else(|| "Unknown Plan".to_string());
    let mut schedule = RateSchedule::new(
        raw.text("utility")
            .unwrap_or_else(|| "Unknown Utility".to_string()),
        plan_name,
        raw.text("description").unwrap_or_default(),
        raw.text("startdate").unwrap_or_default(),
    );

    let energy_rates = raw.array("energyratestructure");
    let weekday_matrix = raw.array("energyweekdayschedule");
    let weekend_matrix = raw.array("energyweekendschedule");

    if energy_rates.is_empty() || weekday_matrix.is_empty() {
        warn!(
            plan = %schedule.plan_name,
            "Rate plan has no TOU structure; treating it as flat-rate"
        );
        if let Some(flat) = extract_flat_price(energy_rates) {
            for season in Season::ALL {
                schedule.seasons.insert(
                    season,
                    SeasonSchedule {
                        season,
                        periods: vec![RatePeriod::all_day(TierLabel::OffPeak, flat)],
                    },
                );
            }
            schedule.fallback_price = flat;
        }
        return schedule;
    }

    let period_prices = period_prices(energy_rates);
    debug!(?period_prices, "Period prices extracted");
    let tiers = classify(&period_prices);

    for season in Season::ALL {
        let month = season.representative_month_index();
        let mut season_schedule = SeasonSchedule::new(season);

        if let Some(row) = weekday_matrix.get(month) {
            season_schedule.periods.extend(hours_to_periods(
                row,
                &period_prices,
                &tiers,
                DayFilter::WeekdaysOnly,
            ));
        }

        match weekend_matrix.get(month) {
            Some(row) => season_schedule.periods.extend(hours_to_periods(
                row,
                &period_prices,
                &tiers,
                DayFilter::WeekendsOnly,
            )),
            // No weekend row: the weekday pattern applies every day
            None => {
                for period in &mut season_schedule.periods {
                    period.days = DayFilter::AllDays;
                }
            }
        }

        schedule.seasons.insert(season, season_schedule);
    }

    if let Some(min) = period_prices.values().copied().min_by(f64::total_cmp) {
        schedule.fallback_price = min;
    }

    info!(
        plan = %schedule.plan_name,
        utility = %schedule.utility_name,
        seasons = schedule.seasons.len(),
        "Parsed rate schedule"
    );
    schedule
}

/// First tier's `rate` plus its `adj`, for every period with a tier list
pub fn period_prices(energy_rates: &[Value]) -> BTreeMap<usize, f64> {
    energy_rates
        .iter()
        .enumerate()
        .filter_map(|(idx, tiers)| {
            let first = tiers.as_array()?.first()?;
            let price = match first.as_object() {
                Some(tier) => {
                    let rate = tier.get("rate").and_then(Value::as_f64).unwrap_or(0.0);
                    let adj = tier.get("adj").and_then(Value::as_f64).unwrap_or(0.0);
                    rate + adj
                }
                None => 0.0,
            };
            Some((idx, price))
        })
        .collect()
}

/// Scalar price of a plan without a TOU matrix
fn extract_flat_price(energy_rates: &[Value]) -> Option<f64> {
    energy_rates
        .first()?
        .as_array()?
        .first()?
        .get("rate")?
        .as_f64()
}

/// Run-length encode one 24-hour matrix row into periods.
///
/// Consecutive hours with the same period index merge; the run open at
/// hour 24 always closes. Rows shorter than 24 entries, or with non-integer
/// entries, yield nothing.
pub fn hours_to_periods(
    row: &Value,
    period_prices: &BTreeMap<usize, f64>,
    tiers: &BTreeMap<usize, TierLabel>,
    days: DayFilter,
) -> Vec<RatePeriod> {
    let Some(hours) = row_indices(row) else {
        return Vec::new();
    };

    let mut periods = Vec::new();
    let mut start = 0;
    for hour in 1..=HOURS_PER_DAY {
        if hour < HOURS_PER_DAY && hours[hour] == hours[start] {
            continue;
        }
        let idx = hours[start];
        let key = usize::try_from(idx).ok();
        periods.push(RatePeriod {
            tier: key
                .and_then(|k| tiers.get(&k))
                .copied()
                .unwrap_or(TierLabel::OffPeak),
            price: key
                .and_then(|k| period_prices.get(&k))
                .copied()
                .unwrap_or(0.0),
            start_hour: start as u32,
            end_hour: hour as u32,
            days,
        });
        start = hour;
    }
    periods
}

fn row_indices(row: &Value) -> Option<[i64; HOURS_PER_DAY]> {
    let entries = row.as_array()?;
    if entries.len() < HOURS_PER_DAY {
        return None;
    }
    let mut hours = [0i64; HOURS_PER_DAY];
    for (slot, entry) in hours.iter_mut().zip(entries) {
        *slot = entry.as_i64()?;
    }
    Some(hours)
}
