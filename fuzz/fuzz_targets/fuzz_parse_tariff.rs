#![no_main]
use libfuzzer_sys::fuzz_target;
use tou_rates::openei::RawTariff;

fuzz_target!(|data: &[u8]| {
    // Only well-formed JSON reaches the parser in production
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let schedule = tou_rates::tariff::parse(&RawTariff::new(document));
    for season in schedule.seasons.values() {
        for period in &season.periods {
            assert!(period.start_hour < period.end_hour && period.end_hour <= 24);
        }
    }
});
