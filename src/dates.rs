//! Calendar-day bucketing and the date layouts used in stored keys and labels.
//!
//! Functions that depend on "local" time take the zone from a `DateTime<Tz>` argument, so the
//! binary passes `Local` and tests pass a fixed offset.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// `Date.toDateString()` layout, e.g. `Sun Oct 04 2026`.
pub const DATE_STRING_FORMAT: &str = "%a %b %d %Y";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Older days show the weekday name and time (activity log).
    Weekday,
    /// Older days show `Oct 4, 2026` (journal).
    CalendarDate,
}

pub fn date_string(date: NaiveDate) -> String {
    date.format(DATE_STRING_FORMAT).to_string()
}

/// Accepts the `toDateString` layout or `YYYY-MM-DD`.
pub fn parse_date_string(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_STRING_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT))
        .ok()
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday().into())
}

/// The instant local midnight begins `day` in `tz`. When midnight is skipped by a DST
/// transition, the first valid local minute after it is used.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    if let Some(timestamp) = local_naive_to_utc(tz, midnight) {
        return timestamp;
    }

    let mut cursor = midnight + Duration::minutes(1);
    for _ in 0..120 {
        if let Some(timestamp) = local_naive_to_utc(tz, cursor) {
            return timestamp;
        }
        cursor += Duration::minutes(1);
    }

    log::warn!("no valid local time near midnight of {day}, treating it as UTC");
    midnight.and_utc()
}

/// Local `[midnight, next midnight)` of the day containing `now`.
pub fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (start_of_day(&tz, today), start_of_day(&tz, tomorrow))
}

/// Local midnight of the most recent Sunday.
pub fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    start_of_day(&now.timezone(), week_start(now.date_naive()))
}

pub fn day_label<Tz: TimeZone>(
    timestamp: DateTime<Utc>,
    now: &DateTime<Tz>,
    style: LabelStyle,
) -> String {
    let local = timestamp.with_timezone(&now.timezone()).naive_local();
    let today = now.date_naive();
    let time = clock_time(local);

    if local.date() == today {
        format!("Today · {time}")
    } else if today.pred_opt() == Some(local.date()) {
        format!("Yesterday · {time}")
    } else {
        match style {
            LabelStyle::Weekday => format!("{} · {time}", local.format("%A")),
            LabelStyle::CalendarDate => local.format("%b %-d, %Y").to_string(),
        }
    }
}

/// `09:05 AM`
pub fn clock_time(local: NaiveDateTime) -> String {
    local.format("%I:%M %p").to_string()
}

/// Cells of a Sunday-first month view: a `None` for each weekday before the 1st, then every
/// day of the month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells = vec![None; leading];
    let mut day = first;
    while day.month() == month {
        cells.push(Some(day));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    Some(cells)
}

fn local_naive_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local_datetime) => Some(local_datetime.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => Some(first.min(second).with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
