//! Tier names from the relative order of a tariff's distinct prices

use super::TierLabel;
use std::collections::BTreeMap;

/// Distinct prices, ascending
fn distinct_prices(period_prices: &BTreeMap<usize, f64>) -> Vec<f64> {
    let mut prices: Vec<f64> = period_prices.values().copied().collect();
    prices.sort_by(f64::total_cmp);
    prices.dedup();
    prices
}

/// Label every period index by where its price ranks among the distinct
/// prices of the tariff. Equal prices always share a label.
pub fn classify(period_prices: &BTreeMap<usize, f64>) -> BTreeMap<usize, TierLabel> {
    let unique = distinct_prices(period_prices);
    let (Some(&lowest), Some(&highest)) = (unique.first(), unique.last()) else {
        return BTreeMap::new();
    };

    let label_for = |price: f64| -> TierLabel {
        match unique.len() {
            0 | 1 => TierLabel::OffPeak,
            2 => {
                if price == highest {
                    TierLabel::Peak
                } else {
                    TierLabel::OffPeak
                }
            }
            3 => {
                if price == highest {
                    TierLabel::Peak
                } else if price == lowest {
                    TierLabel::OffPeak
                } else {
                    TierLabel::PartialPeak
                }
            }
            n => {
                if price == highest {
                    TierLabel::Peak
                } else if price == lowest {
                    TierLabel::SuperOffPeak
                } else if price == unique[n - 2] {
                    TierLabel::PartialPeak
                } else {
                    TierLabel::OffPeak
                }
            }
        }
    };

    period_prices
        .iter()
        .map(|(&idx, &price)| (idx, label_for(price)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(values: &[f64]) -> BTreeMap<usize, f64> {
        values.iter().copied().enumerate().collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(classify(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_single_price_is_off_peak() {
        let tiers = classify(&prices(&[0.3, 0.3]));
        assert!(tiers.values().all(|t| *t == TierLabel::OffPeak));
    }

    #[test]
    fn test_two_prices() {
        let tiers = classify(&prices(&[0.25, 0.45]));
        assert_eq!(tiers[&0], TierLabel::OffPeak);
        assert_eq!(tiers[&1], TierLabel::Peak);
    }

    #[test]
    fn test_three_prices() {
        let tiers = classify(&prices(&[0.45, 0.20, 0.30]));
        assert_eq!(tiers[&0], TierLabel::Peak);
        assert_eq!(tiers[&1], TierLabel::OffPeak);
        assert_eq!(tiers[&2], TierLabel::PartialPeak);
    }

    #[test]
    fn test_five_prices() {
        let tiers = classify(&prices(&[0.10, 0.50, 0.20, 0.40, 0.30]));
        assert_eq!(tiers[&0], TierLabel::SuperOffPeak);
        assert_eq!(tiers[&1], TierLabel::Peak);
        assert_eq!(tiers[&2], TierLabel::OffPeak);
        assert_eq!(tiers[&3], TierLabel::PartialPeak);
        assert_eq!(tiers[&4], TierLabel::OffPeak);
    }

    #[test]
    fn test_ties_share_label() {
        let tiers = classify(&prices(&[0.45, 0.20, 0.45, 0.30, 0.20, 0.12]));
        assert_eq!(tiers[&0], tiers[&2]);
        assert_eq!(tiers[&1], tiers[&4]);
        assert_eq!(tiers[&0], TierLabel::Peak);
        assert_eq!(tiers[&5], TierLabel::SuperOffPeak);
    }

    #[test]
    fn test_monotonic_in_price() {
        let input = prices(&[0.31, 0.12, 0.55, 0.18, 0.40, 0.12, 0.27]);
        let tiers = classify(&input);
        for (a, pa) in &input {
            for (b, pb) in &input {
                if pa < pb {
                    assert!(tiers[a] <= tiers[b], "{} -> {:?} vs {} -> {:?}", pa, tiers[a], pb, tiers[b]);
                }
            }
        }
    }
}
