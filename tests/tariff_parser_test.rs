use chrono::TimeZone;
use chrono_tz::America::Los_Angeles;
use serde_json::{Value, json};
use tou_rates::openei::RawTariff;
use tou_rates::resolver::resolve;
use tou_rates::tariff::{DayFilter, Season, TierLabel, parse};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn matrix(row: &[i64]) -> Value {
    json!(vec![row.to_vec(); 12])
}

fn weekday_row() -> Vec<i64> {
    (0..24).map(|h| i64::from((16..21).contains(&h))).collect()
}

fn tou_document() -> Value {
    json!({
        "utility": "Example Utility",
        "name": "TOU-D-PRIME",
        "label": "5b0d1f2c",
        "description": "Residential time of use",
        "startdate": 1_700_000_000,
        "energyratestructure": [
            [{"rate": 0.23, "adj": 0.02}],
            [{"rate": 0.40, "adj": 0.05}]
        ],
        "energyweekdayschedule": matrix(&weekday_row()),
        "energyweekendschedule": matrix(&[0; 24]),
    })
}

#[test]
fn parses_full_tou_document() {
    let schedule = parse(&RawTariff::new(tou_document()));
    assert_eq!(schedule.utility_name, "Example Utility");
    assert_eq!(schedule.plan_name, "TOU-D-PRIME");
    assert_eq!(schedule.effective_date, "1700000000");
    assert_eq!(schedule.seasons.len(), 2);
    assert!(approx(schedule.fallback_price, 0.25));

    let winter = schedule.season(Season::Winter).unwrap();
    let layout: Vec<(u32, u32, TierLabel, DayFilter)> = winter
        .periods
        .iter()
        .map(|p| (p.start_hour, p.end_hour, p.tier, p.days))
        .collect();
    assert_eq!(
        layout,
        vec![
            (0, 16, TierLabel::OffPeak, DayFilter::WeekdaysOnly),
            (16, 21, TierLabel::Peak, DayFilter::WeekdaysOnly),
            (21, 24, TierLabel::OffPeak, DayFilter::WeekdaysOnly),
            (0, 24, TierLabel::OffPeak, DayFilter::WeekendsOnly),
        ]
    );
    assert!(approx(winter.periods[1].price, 0.45));
}

#[test]
fn parsed_document_resolves_weekday_peak() {
    let schedule = parse(&RawTariff::new(tou_document()));

    let tuesday = Los_Angeles.with_ymd_and_hms(2025, 1, 14, 17, 0, 0).unwrap();
    let rate = resolve(&schedule, &tuesday).unwrap();
    assert!(approx(rate.price, 0.45));
    assert_eq!(rate.tier, TierLabel::Peak);
    assert_eq!(
        rate.next_change.unwrap().to_rfc3339(),
        "2025-01-14T21:00:00-08:00"
    );

    let saturday = Los_Angeles.with_ymd_and_hms(2025, 1, 18, 17, 0, 0).unwrap();
    let rate = resolve(&schedule, &saturday).unwrap();
    assert!(approx(rate.price, 0.25));
    assert_eq!(rate.tier, TierLabel::OffPeak);
    assert!(rate.next_change.is_none());
}

#[test]
fn missing_weekend_matrix_applies_weekday_pattern_every_day() {
    let mut doc = tou_document();
    doc.as_object_mut().unwrap().remove("energyweekendschedule");
    let schedule = parse(&RawTariff::new(doc));

    for season in Season::ALL {
        let periods = &schedule.season(season).unwrap().periods;
        assert_eq!(periods.len(), 3);
        assert!(periods.iter().all(|p| p.days == DayFilter::AllDays));
    }

    let saturday = Los_Angeles.with_ymd_and_hms(2025, 1, 18, 17, 0, 0).unwrap();
    assert_eq!(resolve(&schedule, &saturday).unwrap().tier, TierLabel::Peak);
}

#[test]
fn flat_rate_document() {
    let doc = json!({
        "utility": "Flat Co",
        "label": "flat-1",
        "energyratestructure": [[{"rate": 0.19}]]
    });
    let schedule = parse(&RawTariff::new(doc));
    assert_eq!(schedule.plan_name, "flat-1");
    assert!(approx(schedule.fallback_price, 0.19));
    for season in Season::ALL {
        let periods = &schedule.season(season).unwrap().periods;
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start_hour, 0);
        assert_eq!(periods[0].end_hour, 24);
        assert_eq!(periods[0].days, DayFilter::AllDays);
        assert_eq!(periods[0].tier, TierLabel::OffPeak);
    }
}

#[test]
fn empty_document_has_no_seasons() {
    let schedule = parse(&RawTariff::new(json!({})));
    assert_eq!(schedule.utility_name, "Unknown Utility");
    assert_eq!(schedule.plan_name, "Unknown Plan");
    assert!(schedule.seasons.is_empty());
    assert!(schedule.is_empty());
}

#[test]
fn wrong_json_types_are_treated_as_absent() {
    let doc = json!({
        "utility": 42,
        "energyratestructure": "not a table",
        "energyweekdayschedule": {"also": "wrong"}
    });
    let schedule = parse(&RawTariff::new(doc));
    assert_eq!(schedule.utility_name, "42");
    assert!(schedule.seasons.is_empty());
}

#[test]
fn short_rows_yield_no_periods() {
    let mut doc = tou_document();
    doc["energyweekdayschedule"] = json!(vec![vec![0, 1, 0]; 12]);
    doc["energyweekendschedule"] = json!(vec![vec![0, 1, 0]; 12]);
    let schedule = parse(&RawTariff::new(doc));
    for season in Season::ALL {
        assert!(schedule.season(season).unwrap().periods.is_empty());
    }
}

#[test]
fn four_price_tariff_uses_every_tier() {
    let mut doc = tou_document();
    doc["energyratestructure"] = json!([
        [{"rate": 0.10}],
        [{"rate": 0.20}],
        [{"rate": 0.30}],
        [{"rate": 0.50}]
    ]);
    let row: Vec<i64> = (0..24)
        .map(|h| match h {
            0..=5 => 0,
            6..=14 => 1,
            15 | 16 => 2,
            17..=20 => 3,
            _ => 1,
        })
        .collect();
    doc["energyweekdayschedule"] = matrix(&row);
    let schedule = parse(&RawTariff::new(doc));

    let tiers: Vec<TierLabel> = schedule.season(Season::Summer).unwrap().periods[..5]
        .iter()
        .map(|p| p.tier)
        .collect();
    assert_eq!(
        tiers,
        vec![
            TierLabel::SuperOffPeak,
            TierLabel::OffPeak,
            TierLabel::PartialPeak,
            TierLabel::Peak,
            TierLabel::OffPeak
        ]
    );
    assert!(approx(schedule.fallback_price, 0.10));
}

#[test]
fn parsing_is_idempotent() {
    let raw = RawTariff::new(tou_document());
    assert_eq!(parse(&raw), parse(&raw));
}
