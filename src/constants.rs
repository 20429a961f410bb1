//! Configuration constants for the quiz attempt engine
//!
//! This module contains the limits and constraints used throughout the
//! crate to keep question banks well-formed and to give the countdown
//! consistent boundaries.

/// Quiz-wide configuration constants
pub mod quiz {
    /// Maximum number of questions a single quiz may contain
    pub const MAX_QUESTION_COUNT: usize = 200;
    /// Minimum time limit of a quiz in minutes
    pub const MIN_TIME_LIMIT_MINUTES: u64 = 1;
    /// Maximum time limit of a quiz in minutes
    pub const MAX_TIME_LIMIT_MINUTES: u64 = 300;
    /// Maximum length of a quiz name in characters
    pub const MAX_NAME_LENGTH: usize = 200;
}

/// Question configuration constants
pub mod question {
    /// Minimum length of a question prompt
    pub const MIN_PROMPT_LENGTH: usize = 1;
    /// Maximum length of a question prompt
    pub const MAX_PROMPT_LENGTH: usize = 1000;
    /// Minimum number of answer options for a question
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of answer options, one per letter label
    pub const MAX_OPTION_COUNT: usize = 26;
    /// Maximum length of a single answer option
    pub const MAX_OPTION_LENGTH: usize = 300;
}

/// Countdown timer constants
pub mod timer {
    /// Seconds in a minute, used to convert quiz time limits
    pub const SECONDS_PER_MINUTE: u64 = 60;
    /// Default interval between ticks in milliseconds
    pub const TICK_INTERVAL_MILLIS: u64 = 1000;
    /// Remaining time below which the clock is shown as expiring
    pub const EXPIRING_THRESHOLD_SECONDS: u64 = 60;
}
