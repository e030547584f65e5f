// Working-hours classification of localized wall-clock times
use chrono::{NaiveDateTime, Timelike};

/// First working hour of the day
pub const WORK_START_HOUR: u32 = 9;
/// Last working hour of the day, inclusive (22:59 still counts)
pub const WORK_END_HOUR: u32 = 22;

/// True iff the hour component of an already-localized time is in [9, 22]
pub fn is_working_hours(instant: &NaiveDateTime) -> bool {
    (WORK_START_HOUR..=WORK_END_HOUR).contains(&instant.hour())
}
