//! Unit tests covering worker configuration resolution and layering.

use super::*;
use crate::config::{DEFAULT_RETENTION_DAYS, MAX_FORECAST_DAYS, config_from_layers_for_test};
use camino::Utf8PathBuf;
use chrono::TimeDelta;
use rstest::rstest;
use std::time::Duration;
use swellcheck_data::{DEFAULT_FORECAST_DAYS, DEFAULT_SEA_LEVEL_URL, DEFAULT_WEATHER_URL};

fn args_with_database() -> WorkerArgs {
    WorkerArgs {
        database: Some(Utf8PathBuf::from("surf.db")),
        ..WorkerArgs::default()
    }
}

#[rstest]
fn converting_without_database_errors() {
    let err = WorkerConfig::try_from(WorkerArgs::default()).expect_err("database is required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_DATABASE);
            assert_eq!(env, ENV_DATABASE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn unset_options_fall_back_to_defaults() {
    let config = WorkerConfig::try_from(args_with_database()).expect("config should build");
    assert_eq!(config.database, Utf8PathBuf::from("surf.db"));
    assert!(config.api_keys.is_empty());
    assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
    assert_eq!(config.sea_level_url, DEFAULT_SEA_LEVEL_URL);
    assert_eq!(config.forecast_days, DEFAULT_FORECAST_DAYS);
    assert_eq!(config.retention_days, DEFAULT_RETENTION_DAYS);
    assert_eq!(config.request_timeout, Duration::from_secs(20));
}

#[rstest]
#[case::no_forecast_days(Some(0), None, ARG_FORECAST_DAYS)]
#[case::no_timeout(None, Some(0), ARG_REQUEST_TIMEOUT_SECS)]
#[case::too_many_days(Some(MAX_FORECAST_DAYS + 1), None, ARG_FORECAST_DAYS)]
#[case::days_past_the_calendar(Some(u32::MAX), None, ARG_FORECAST_DAYS)]
fn out_of_range_values_are_rejected(
    #[case] forecast_days: Option<u32>,
    #[case] timeout: Option<u64>,
    #[case] expected: &'static str,
) {
    let args = WorkerArgs {
        forecast_days,
        request_timeout_secs: timeout,
        ..args_with_database()
    };
    let err = WorkerConfig::try_from(args).expect_err("out-of-range value should error");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn cycle_settings_carry_keys_and_retention() {
    let args = WorkerArgs {
        api_keys: Some(vec!["first".to_owned(), " ".to_owned(), "second".to_owned()]),
        forecast_days: Some(3),
        retention_days: Some(2),
        ..args_with_database()
    };
    let config = WorkerConfig::try_from(args).expect("config should build");
    let settings = config.cycle_settings();
    assert_eq!(settings.refresh.key_count(), 2);
    assert_eq!(settings.refresh.key_for(3), Some("second"));
    assert_eq!(settings.refresh.forecast_days(), 3);
    assert_eq!(settings.retention, TimeDelta::days(2));
}

#[rstest]
fn source_config_uses_configured_endpoints() {
    let args = WorkerArgs {
        weather_url: Some("http://localhost:9000/weather".to_owned()),
        sea_level_url: Some("http://localhost:9000/sea-level".to_owned()),
        request_timeout_secs: Some(5),
        ..args_with_database()
    };
    let config = WorkerConfig::try_from(args).expect("config should build");
    let source = config.source_config();
    assert_eq!(source.weather_url, "http://localhost:9000/weather");
    assert_eq!(source.sea_level_url, "http://localhost:9000/sea-level");
    assert_eq!(source.timeout, Duration::from_secs(5));
}

#[rstest]
fn run_subcommand_parses_flags() {
    let cli = Cli::try_parse_from([
        "swellcheck",
        "run",
        "--database",
        "data/surf.db",
        "--api-keys",
        "alpha,beta",
        "--retention-days",
        "14",
    ])
    .expect("flags should parse");
    let Command::Run(args) = cli.command;
    assert_eq!(args.database, Some(Utf8PathBuf::from("data/surf.db")));
    assert_eq!(
        args.api_keys,
        Some(vec!["alpha".to_owned(), "beta".to_owned()])
    );
    assert_eq!(args.retention_days, Some(14));
    assert_eq!(args.forecast_days, None);
}

#[rstest]
fn unknown_flags_are_rejected() {
    let err = Cli::try_parse_from(["swellcheck", "run", "--spots", "1"])
        .expect_err("unknown flag should fail");
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "forecast_days": "a week" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "from-file.db",
            "forecast_days": 3,
            "sea_level_url": "http://from-file/sea-level",
        }),
        None,
    );
    composer.push_environment(json!({
        "database": "from-env.db",
        "forecast_days": 4,
    }));
    composer.push_cli(json!({
        "forecast_days": 5,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.database, Utf8PathBuf::from("from-env.db"));
    assert_eq!(config.forecast_days, 5);
    assert_eq!(config.sea_level_url, "http://from-file/sea-level");
    assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
    assert_eq!(config.retention_days, DEFAULT_RETENTION_DAYS);
}
