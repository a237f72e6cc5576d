use time::{Duration, PrimitiveDateTime};

pub(crate) fn time_limit(time_limit_minutes: i32) -> Duration {
    Duration::minutes(i64::from(time_limit_minutes))
}

pub(crate) fn deadline(started_at: PrimitiveDateTime, time_limit_minutes: i32) -> PrimitiveDateTime {
    started_at + time_limit(time_limit_minutes)
}

/// A submission landing exactly on the deadline still counts as on time.
pub(crate) fn is_past_deadline(
    started_at: PrimitiveDateTime,
    time_limit_minutes: i32,
    now: PrimitiveDateTime,
) -> bool {
    now - started_at > time_limit(time_limit_minutes)
}

pub(crate) fn remaining_seconds(
    started_at: PrimitiveDateTime,
    time_limit_minutes: i32,
    now: PrimitiveDateTime,
) -> i64 {
    let remaining = deadline(started_at, time_limit_minutes) - now;
    remaining.whole_seconds().max(0)
}
