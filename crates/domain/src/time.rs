//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for refresh bookkeeping.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether `last` is missing or older than `max_age` at `at`.
#[must_use]
pub fn is_stale(last: Option<Timestamp>, max_age: TimeDelta, at: Timestamp) -> bool {
    last.is_none_or(|ts| at - ts > max_age)
}
