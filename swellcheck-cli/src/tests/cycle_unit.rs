//! Unit tests for the worker cycle.

use super::*;
use crate::tests::helpers::{
    PRESET_NAME, SPOT_ID, USER_ID, block_on, now, provider_hours, seeded_store, settings,
    stub_source,
};
use chrono::TimeDelta;
use rstest::rstest;
use std::sync::Arc;
use swellcheck_core::test_support::{FixedScorer, MemoryStore};
use swellcheck_data::test_support::StubMarineSource;
use swellcheck_data::{RefreshError, SourceError};
use swellcheck_scorer::{RecommendationError, TODAY_KEY};

fn cycle(store: &Arc<MemoryStore>, source: &StubMarineSource, keys: &[&str]) -> CycleReport {
    block_on(run_cycle(
        Arc::clone(store),
        source,
        Arc::new(FixedScorer::new(50.0)),
        &settings(keys),
        now(),
    ))
}

#[rstest]
fn full_cycle_refreshes_recommends_and_cleans_up() {
    let store = Arc::new(seeded_store());
    let source = stub_source();

    let report = cycle(&store, &source, &["key-a"]);

    let refresh = report.refresh.as_ref().expect("refresh should run");
    assert_eq!(refresh.refreshed, vec![(SPOT_ID, 2)]);
    let recommendations = report
        .recommendations
        .as_ref()
        .expect("recommendations should run");
    assert_eq!(
        recommendations.saved_keys(USER_ID),
        vec![PRESET_NAME, TODAY_KEY]
    );
    assert_eq!(report.cleanup.as_ref().ok(), Some(&1));
    let stored: Vec<_> = store
        .forecasts_for(SPOT_ID)
        .iter()
        .map(|record| record.timestamp_utc)
        .collect();
    assert_eq!(stored, provider_hours());
    assert!(report.is_clean());
}

#[rstest]
fn cleanup_runs_when_listing_fails() {
    let store = Arc::new(
        seeded_store()
            .failing_spot_listing()
            .failing_preset_listing(),
    );
    let source = stub_source();

    let report = cycle(&store, &source, &["key-a"]);

    assert!(matches!(report.refresh, Err(RefreshError::ListSpots { .. })));
    assert!(matches!(
        report.recommendations,
        Err(RecommendationError::ListPresets { .. })
    ));
    assert_eq!(report.cleanup.as_ref().ok(), Some(&1));
    assert!(source.requests().is_empty());
    assert!(!report.is_clean());
}

#[rstest]
fn provider_failure_is_reported_without_stopping_the_cycle() {
    let store = Arc::new(seeded_store());
    let source = StubMarineSource::with_error(SourceError::Http {
        url: "http://provider/weather".to_owned(),
        status: 503,
        message: "unavailable".to_owned(),
    });

    let report = cycle(&store, &source, &["key-a"]);

    let refresh = report.refresh.as_ref().expect("refresh should run");
    assert_eq!(refresh.failed_spots(), vec![SPOT_ID]);
    let recommendations = report
        .recommendations
        .as_ref()
        .expect("recommendations should run");
    assert!(recommendations.saved_keys(USER_ID).is_empty());
    assert_eq!(report.cleanup.as_ref().ok(), Some(&1));
    assert!(!report.is_clean());
}

#[rstest]
fn without_api_keys_nothing_is_fetched() {
    let store = Arc::new(seeded_store());
    let source = stub_source();

    let report = cycle(&store, &source, &[]);

    let refresh = report.refresh.as_ref().expect("refresh should run");
    assert!(refresh.refreshed.is_empty());
    assert!(source.requests().is_empty());
    assert_eq!(report.cleanup.as_ref().ok(), Some(&1));
}

#[rstest]
fn retention_beyond_the_calendar_keeps_everything() {
    let store = Arc::new(seeded_store());
    let source = stub_source();
    let mut unbounded = settings(&["key-a"]);
    unbounded.retention = TimeDelta::MAX;

    let report = block_on(run_cycle(
        Arc::clone(&store),
        &source,
        Arc::new(FixedScorer::new(50.0)),
        &unbounded,
        now(),
    ));

    assert_eq!(report.cleanup.as_ref().ok(), Some(&0));
    assert_eq!(store.forecasts_for(SPOT_ID).len(), 3);
}
