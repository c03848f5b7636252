//! Behavioural tests for tide-phase classification using rstest-bdd.

use std::cell::RefCell;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use swellcheck_core::{SeaLevelSample, TidePoint, TideType, classify_tide_phases};

#[derive(Debug, Default)]
struct TideWorld {
    samples: RefCell<Vec<SeaLevelSample>>,
    points: RefCell<Vec<TidePoint>>,
}

#[fixture]
fn world() -> TideWorld {
    TideWorld::default()
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

#[given("hourly sea levels {levels} on {date}")]
fn given_levels(world: &TideWorld, levels: String, date: String) {
    let day = NaiveDate::parse_from_str(unquote(&date), "%Y-%m-%d").expect("valid date");
    let midnight = day
        .and_time(NaiveTime::MIN)
        .and_local_timezone(FixedOffset::east_opt(0).expect("zero offset"))
        .single()
        .expect("unambiguous midnight");
    let mut samples = world.samples.borrow_mut();
    for (hour, level) in unquote(&levels).split(',').enumerate() {
        let level: f64 = level.trim().parse().expect("numeric level");
        let offset = TimeDelta::hours(i64::try_from(hour).expect("small hour index"));
        samples.push(SeaLevelSample::new(midnight + offset, Some(level)));
    }
}

#[when("the tide phases are classified")]
fn when_classified(world: &TideWorld) {
    let points = classify_tide_phases(&world.samples.borrow());
    world.points.replace(points);
}

#[then("the phases are {phases}")]
fn then_phases(world: &TideWorld, phases: String) {
    let expected: Vec<TideType> = unquote(&phases)
        .split(',')
        .map(|label| label.parse().expect("known tide label"))
        .collect();
    let actual: Vec<TideType> = world
        .points
        .borrow()
        .iter()
        .map(|point| point.tide_type)
        .collect();
    assert_eq!(actual, expected);
}

macro_rules! register_tide_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/tide_phase.feature", name = $title)]
        fn $fn_name(world: TideWorld) {
            let _ = world;
        }
    };
}

register_tide_scenario!(single_peak, "A single tidal peak");
register_tide_scenario!(flat_high_tide, "A flat high tide");
register_tide_scenario!(lone_reading, "A lone reading");
register_tide_scenario!(independent_days, "Days do not influence each other");
