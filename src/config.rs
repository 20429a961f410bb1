//! Runtime options for driving a quiz attempt
//!
//! These options are read by the countdown driver. They can be deserialized
//! from JSON (durations in milliseconds) and are validated with `garde`
//! before use.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants;

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds in milliseconds
fn validate_millis<const MIN_MILLIS: u64, const MAX_MILLIS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    let millis = u64::try_from(val.as_millis()).unwrap_or(u64::MAX);
    if (MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_MILLIS},{MAX_MILLIS}] milliseconds",
        )))
    }
}

/// Options controlling the countdown driver
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Interval between two countdown ticks, each tick removes one second
    #[garde(custom(validate_millis::<10, 60_000>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    /// Remaining time below which updates flag the clock as expiring
    #[garde(custom(validate_millis::<0, 3_600_000>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub expiring_threshold: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(constants::timer::TICK_INTERVAL_MILLIS),
            expiring_threshold: Duration::from_secs(constants::timer::EXPIRING_THRESHOLD_SECONDS),
        }
    }
}

impl Options {
    /// Whether the given number of remaining seconds falls under the
    /// expiring threshold
    pub fn is_expiring(&self, remaining_seconds: u64) -> bool {
        remaining_seconds < self.expiring_threshold.as_secs()
    }
}
