//! Property-based tests for tide-phase classification.
//!
//! # Invariants tested
//!
//! - **Length:** every input sample yields exactly one labelled point.
//! - **Ordering:** output is sorted ascending by time.
//! - **Idempotence:** shuffled input classifies identically.
//! - **Day isolation:** classifying days separately matches classifying them
//!   together.
//! - **Nulls:** samples without a level are always `unknown`.

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use proptest::prelude::*;
use swellcheck_core::{SeaLevelSample, TideType, classify_tide_phases};

fn base() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .and_then(|utc| utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single())
        .expect("valid base instant")
}

/// Hourly samples spread over up to three days, with occasional gaps.
fn samples_strategy() -> impl Strategy<Value = Vec<SeaLevelSample>> {
    prop::collection::vec(
        (0_i64..72, prop::option::weighted(0.9, -20_i32..20)),
        0..60,
    )
    .prop_map(|entries| {
        let mut seen = std::collections::BTreeSet::new();
        entries
            .into_iter()
            .filter(|(hour, _)| seen.insert(*hour))
            .map(|(hour, level)| {
                SeaLevelSample::new(
                    base() + Duration::hours(hour),
                    level.map(|tenths| f64::from(tenths) / 10.0),
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn output_length_matches_input(samples in samples_strategy()) {
        prop_assert_eq!(classify_tide_phases(&samples).len(), samples.len());
    }

    #[test]
    fn output_is_sorted_by_time(samples in samples_strategy()) {
        let points = classify_tide_phases(&samples);
        prop_assert!(points.windows(2).all(|pair| pair[0].time <= pair[1].time));
    }

    #[test]
    fn input_order_does_not_matter(samples in samples_strategy()) {
        let mut reversed = samples.clone();
        reversed.reverse();
        prop_assert_eq!(classify_tide_phases(&samples), classify_tide_phases(&reversed));
    }

    #[test]
    fn days_are_classified_independently(samples in samples_strategy()) {
        let together = classify_tide_phases(&samples);
        let mut separately = Vec::new();
        for day in 0..3 {
            let day_samples: Vec<_> = samples
                .iter()
                .copied()
                .filter(|sample| (sample.time - base()).num_days() == day)
                .collect();
            separately.extend(classify_tide_phases(&day_samples));
        }
        separately.sort_by_key(|point| point.time);
        prop_assert_eq!(together, separately);
    }

    #[test]
    fn missing_levels_are_unknown(samples in samples_strategy()) {
        for point in classify_tide_phases(&samples) {
            if point.level.is_none() {
                prop_assert_eq!(point.tide_type, TideType::Unknown);
            }
        }
    }
}
