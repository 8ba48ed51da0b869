//! registry of date-time transforms
//!
//! `Time.*`, `Date.*` and `DateTime.*` calls dispatch into [TRANSFORMS] by method name (case-insensitive).
use crate::error::ResolveError;
use crate::value::{Timestamp, Value};
use chrono::{Datelike, Duration, Local, Months, NaiveTime, TimeZone, Utc};

/// A temporal transform applied to a base date-time
#[derive(Clone, Copy)]
pub enum Transform {
    /// Shift by an integer amount, e.g. `AddDays(SliceStart, -1)`
    Shift(fn(Timestamp, i64) -> Option<Timestamp>),
    /// Transform without parameters, e.g. `StartOfDay(SliceStart)`
    Convert(fn(Timestamp) -> Option<Timestamp>),
}

pub const TRANSFORMS: &[(&str, Transform)] = &[
    ("AddYears", Transform::Shift(add_years)),
    ("AddQuarters", Transform::Shift(add_quarters)),
    ("AddMonths", Transform::Shift(add_months)),
    ("AddWeeks", Transform::Shift(add_weeks)),
    ("AddDays", Transform::Shift(add_days)),
    ("AddHours", Transform::Shift(add_hours)),
    ("AddMinutes", Transform::Shift(add_minutes)),
    ("AddSeconds", Transform::Shift(add_seconds)),
    ("AddMilliseconds", Transform::Shift(add_milliseconds)),
    ("AddTicks", Transform::Shift(add_ticks)),
    ("StartOfDay", Transform::Convert(start_of_day)),
    ("EndOfDay", Transform::Convert(end_of_day)),
    ("StartOfMonth", Transform::Convert(start_of_month)),
    ("EndOfMonth", Transform::Convert(end_of_month)),
    ("ToUniversalTime", Transform::Convert(to_universal_time)),
    ("ToLocalTime", Transform::Convert(to_local_time)),
];

pub fn lookup(method: &str) -> Option<Transform> {
    TRANSFORMS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(method))
        .map(|(_, transform)| *transform)
}

impl Transform {
    /// Apply to `base` with the remaining evaluated arguments of the call
    pub fn apply(
        self,
        function: &str,
        base: Timestamp,
        args: &[Value],
    ) -> Result<Timestamp, ResolveError> {
        let result = match self {
            Transform::Shift(shift) => {
                let [Value::Integer(amount)] = args else {
                    return Err(ResolveError::invalid_argument(
                        function,
                        format!("expected one integer argument, got {}", describe(args)),
                    ));
                };
                shift(base, *amount)
            }
            Transform::Convert(convert) => {
                if !args.is_empty() {
                    return Err(ResolveError::invalid_argument(
                        function,
                        format!("expected no further arguments, got {}", describe(args)),
                    ));
                }
                convert(base)
            }
        };

        result.ok_or_else(|| ResolveError::invalid_argument(function, "date-time out of range"))
    }
}

fn describe(args: &[Value]) -> String {
    let types: Vec<_> = args.iter().map(Value::type_name).collect();
    format!("[{}]", types.join(", "))
}

fn add_months(base: Timestamp, months: i64) -> Option<Timestamp> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        base.checked_sub_months(magnitude)
    } else {
        base.checked_add_months(magnitude)
    }
}

fn add_years(base: Timestamp, years: i64) -> Option<Timestamp> {
    add_months(base, years.checked_mul(12)?)
}

fn add_quarters(base: Timestamp, quarters: i64) -> Option<Timestamp> {
    add_months(base, quarters.checked_mul(3)?)
}

fn add_duration(base: Timestamp, duration: Option<Duration>) -> Option<Timestamp> {
    base.checked_add_signed(duration?)
}

fn add_weeks(base: Timestamp, weeks: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_weeks(weeks))
}

fn add_days(base: Timestamp, days: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_days(days))
}

fn add_hours(base: Timestamp, hours: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_hours(hours))
}

fn add_minutes(base: Timestamp, minutes: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_minutes(minutes))
}

fn add_seconds(base: Timestamp, seconds: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_seconds(seconds))
}

fn add_milliseconds(base: Timestamp, milliseconds: i64) -> Option<Timestamp> {
    add_duration(base, Duration::try_milliseconds(milliseconds))
}

/// One tick is 100 nanoseconds
fn add_ticks(base: Timestamp, ticks: i64) -> Option<Timestamp> {
    add_duration(base, Some(Duration::nanoseconds(ticks.checked_mul(100)?)))
}

fn at_time(base: Timestamp, day: u32, time: NaiveTime) -> Option<Timestamp> {
    let date = base.date_naive().with_day(day)?;
    base.offset()
        .from_local_datetime(&date.and_time(time))
        .single()
}

fn start_of_day(base: Timestamp) -> Option<Timestamp> {
    at_time(base, base.day(), NaiveTime::MIN)
}

fn end_of_day(base: Timestamp) -> Option<Timestamp> {
    at_time(base, base.day(), NaiveTime::from_hms_opt(23, 59, 59)?)
}

fn start_of_month(base: Timestamp) -> Option<Timestamp> {
    at_time(base, 1, NaiveTime::MIN)
}

fn end_of_month(base: Timestamp) -> Option<Timestamp> {
    let first = start_of_month(base)?;
    let last_day = add_months(first, 1)?.checked_sub_signed(Duration::try_days(1)?)?;
    at_time(base, last_day.day(), NaiveTime::from_hms_opt(23, 59, 59)?)
}

fn to_universal_time(base: Timestamp) -> Option<Timestamp> {
    Some(base.with_timezone(&Utc).fixed_offset())
}

fn to_local_time(base: Timestamp) -> Option<Timestamp> {
    Some(base.with_timezone(&Local).fixed_offset())
}
