//! Normalized time-of-use tariff model
//!
//! A [`RateSchedule`] holds, per season, the ordered list of hour ranges that
//! price one day type. Schedules are built by [`parser::parse`] from a raw
//! OpenEI document and are read-only afterwards.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod parser;
pub mod tiers;

pub use parser::parse;
pub use tiers::classify;

/// First and last calendar month of summer, inclusive
pub const SUMMER_MONTHS: std::ops::RangeInclusive<u32> = 6..=9;

/// Half-year pricing bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    pub const ALL: [Season; 2] = [Season::Summer, Season::Winter];

    /// Season of a calendar month (1-12)
    pub fn for_month(month: u32) -> Self {
        if SUMMER_MONTHS.contains(&month) {
            Self::Summer
        } else {
            Self::Winter
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_month(date.month())
    }

    /// Zero-based month whose matrix row stands in for the whole season
    pub fn representative_month_index(&self) -> usize {
        match self {
            Self::Summer => (*SUMMER_MONTHS.start() - 1) as usize,
            Self::Winter => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative price bracket within one tariff.
///
/// Variants are declared cheapest first, so the derived ordering ranks how
/// "peak" a tier is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLabel {
    SuperOffPeak,
    OffPeak,
    PartialPeak,
    Peak,
}

impl TierLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperOffPeak => "super_off_peak",
            Self::OffPeak => "off_peak",
            Self::PartialPeak => "partial_peak",
            Self::Peak => "peak",
        }
    }
}

impl std::fmt::Display for TierLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekday (Mon-Fri) or weekend (Sat-Sun)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self::of(date.weekday())
    }
}

/// Which day types a period applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    #[default]
    AllDays,
    WeekdaysOnly,
    WeekendsOnly,
}

impl DayFilter {
    pub fn includes(&self, day: DayType) -> bool {
        match self {
            Self::AllDays => true,
            Self::WeekdaysOnly => day == DayType::Weekday,
            Self::WeekendsOnly => day == DayType::Weekend,
        }
    }
}

/// A contiguous hour range carrying one price.
///
/// `end_hour` is exclusive and may be 24. When `start_hour > end_hour` the
/// range wraps midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub tier: TierLabel,
    /// $/kWh
    pub price: f64,
    pub start_hour: u32,
    pub end_hour: u32,
    pub days: DayFilter,
}

impl RatePeriod {
    /// Every hour of every day at one price
    pub fn all_day(tier: TierLabel, price: f64) -> Self {
        Self {
            tier,
            price,
            start_hour: 0,
            end_hour: 24,
            days: DayFilter::AllDays,
        }
    }

    pub fn applies_weekdays_only(&self) -> bool {
        self.days == DayFilter::WeekdaysOnly
    }

    pub fn applies_weekends_only(&self) -> bool {
        self.days == DayFilter::WeekendsOnly
    }

    pub fn applies_to(&self, day: DayType) -> bool {
        self.days.includes(day)
    }

    /// Whether `hour` (0-23) falls inside the range
    pub fn covers_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn matches(&self, hour: u32, day: DayType) -> bool {
        self.applies_to(day) && self.covers_hour(hour)
    }

    /// Same price and tier, regardless of the hour range
    pub fn same_rate_as(&self, other: &RatePeriod) -> bool {
        self.tier == other.tier && self.price == other.price
    }
}

/// Periods for one season, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSchedule {
    pub season: Season,
    pub periods: Vec<RatePeriod>,
}

impl SeasonSchedule {
    pub fn new(season: Season) -> Self {
        Self {
            season,
            periods: Vec::new(),
        }
    }

    /// First period in declaration order active at `hour` on `day`
    pub fn period_at(&self, hour: u32, day: DayType) -> Option<&RatePeriod> {
        self.periods.iter().find(|p| p.matches(hour, day))
    }

    pub fn periods_for(&self, day: DayType) -> impl Iterator<Item = &RatePeriod> {
        self.periods.iter().filter(move |p| p.applies_to(day))
    }
}

/// Complete parsed rate schedule for a utility plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub utility_name: String,
    pub plan_name: String,
    pub description: String,
    pub effective_date: String,
    pub seasons: BTreeMap<Season, SeasonSchedule>,
    /// Used only when no period matches a query
    pub fallback_price: f64,
    pub fallback_tier: TierLabel,
}

impl RateSchedule {
    pub fn new(
        utility_name: impl Into<String>,
        plan_name: impl Into<String>,
        description: impl Into<String>,
        effective_date: impl Into<String>,
    ) -> Self {
        Self {
            utility_name: utility_name.into(),
            plan_name: plan_name.into(),
            description: description.into(),
            effective_date: effective_date.into(),
            seasons: BTreeMap::new(),
            fallback_price: 0.0,
            fallback_tier: TierLabel::OffPeak,
        }
    }

    pub fn season(&self, season: Season) -> Option<&SeasonSchedule> {
        self.seasons.get(&season)
    }

    /// True when parsing recovered no usable price at all
    pub fn is_empty(&self) -> bool {
        self.seasons.values().all(|s| s.periods.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: u32, end: u32, days: DayFilter) -> RatePeriod {
        RatePeriod {
            tier: TierLabel::OffPeak,
            price: 0.2,
            start_hour: start,
            end_hour: end,
            days,
        }
    }

    #[test]
    fn test_season_boundaries() {
        let summer: Vec<u32> = (1..=12)
            .filter(|m| Season::for_month(*m) == Season::Summer)
            .collect();
        assert_eq!(summer, vec![6, 7, 8, 9]);
        assert_eq!(Season::Summer.representative_month_index(), 5);
        assert_eq!(Season::Winter.representative_month_index(), 0);
    }

    #[test]
    fn test_wraparound_hours() {
        let p = period(21, 6, DayFilter::AllDays);
        let covered: Vec<u32> = (0..24).filter(|h| p.covers_hour(*h)).collect();
        assert_eq!(covered, vec![0, 1, 2, 3, 4, 5, 21, 22, 23]);
    }

    #[test]
    fn test_full_day_covers_everything() {
        let p = period(0, 24, DayFilter::AllDays);
        assert!((0..24).all(|h| p.covers_hour(h)));
    }

    #[test]
    fn test_day_filter() {
        let weekday = period(0, 24, DayFilter::WeekdaysOnly);
        assert!(weekday.matches(3, DayType::Weekday));
        assert!(!weekday.matches(3, DayType::Weekend));
        assert!(weekday.applies_weekdays_only());
        assert!(!weekday.applies_weekends_only());

        let weekend = period(0, 24, DayFilter::WeekendsOnly);
        assert!(weekend.matches(3, DayType::Weekend));
        assert!(!weekend.matches(3, DayType::Weekday));

        assert_eq!(DayType::of(Weekday::Sat), DayType::Weekend);
        assert_eq!(DayType::of(Weekday::Fri), DayType::Weekday);
    }

    #[test]
    fn test_tier_ordering_and_labels() {
        assert!(TierLabel::SuperOffPeak < TierLabel::OffPeak);
        assert!(TierLabel::OffPeak < TierLabel::PartialPeak);
        assert!(TierLabel::PartialPeak < TierLabel::Peak);
        assert_eq!(TierLabel::PartialPeak.to_string(), "partial_peak");
        assert_eq!(
            serde_json::to_string(&TierLabel::SuperOffPeak).unwrap(),
            "\"super_off_peak\""
        );
    }
}
