//! Daily wall-clock timers
//!
//! Report times are interpreted in UTC. A time that equals `now` exactly is
//! treated as already passed, so a timer that just fired never fires twice.

use chrono::{DateTime, Days, NaiveTime, Utc};

/// Next instant strictly after `now` whose UTC time of day is `at`
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        return today;
    }

    now.date_naive()
        .checked_add_days(Days::new(1))
        .map(|tomorrow| tomorrow.and_time(at).and_utc())
        .unwrap_or(today)
}
