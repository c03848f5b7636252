//! Shared test harness modules for the swellcheck CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod config_unit;
mod cycle_unit;
mod helpers;
