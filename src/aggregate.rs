use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::dates::{day_bounds, start_of_week};
use crate::models::{ActiveTimer, Category, TimeEntry};

/// Dashboard figures in seconds, with the running timer's elapsed time already added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSummary {
    pub today_seconds: i64,
    pub week_seconds: i64,
}

/// Sums the duration of entries whose end falls in `[start, end_exclusive)`.
pub fn total_for_range(
    entries: &[TimeEntry],
    start: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
) -> i64 {
    entries
        .iter()
        .filter(|entry| entry.end_time >= start && entry.end_time < end_exclusive)
        .map(|entry| entry.duration)
        .sum()
}

pub fn active_elapsed(timer: Option<&ActiveTimer>, now: DateTime<Utc>) -> i64 {
    timer.map_or(0, |timer| timer.elapsed_seconds(now))
}

pub fn today_total<Tz: TimeZone>(
    entries: &[TimeEntry],
    timer: Option<&ActiveTimer>,
    now: &DateTime<Tz>,
) -> i64 {
    let (start, end) = day_bounds(now);
    let now = now.with_timezone(&Utc);
    total_for_range(entries, start, end) + active_elapsed(timer, now)
}

/// Entries ending between Sunday 00:00 local time and `now`, both inclusive.
pub fn week_total<Tz: TimeZone>(
    entries: &[TimeEntry],
    timer: Option<&ActiveTimer>,
    now: &DateTime<Tz>,
) -> i64 {
    let start = start_of_week(now);
    let now = now.with_timezone(&Utc);
    let completed: i64 = entries
        .iter()
        .filter(|entry| entry.end_time >= start && entry.end_time <= now)
        .map(|entry| entry.duration)
        .sum();
    completed + active_elapsed(timer, now)
}

pub fn summarize<Tz: TimeZone>(
    entries: &[TimeEntry],
    timer: Option<&ActiveTimer>,
    now: &DateTime<Tz>,
) -> TimeSummary {
    TimeSummary {
        today_seconds: today_total(entries, timer, now),
        week_seconds: week_total(entries, timer, now),
    }
}

/// Per-category totals over `[start, end_exclusive)`, largest first.
pub fn category_totals(
    entries: &[TimeEntry],
    start: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
) -> Vec<(Category, i64)> {
    let mut totals: HashMap<Category, i64> = HashMap::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.end_time >= start && entry.end_time < end_exclusive)
    {
        *totals.entry(entry.category).or_insert(0) += entry.duration;
    }

    let mut rows = totals.into_iter().collect::<Vec<_>>();
    rows.sort_by(|left, right| {
        right
            .1
            .cmp(&left.1)
            .then_with(|| left.0.as_str().cmp(right.0.as_str()))
    });
    rows
}

/// Dashboard layout: always shows hours, e.g. `0h 5m`.
pub fn format_hours_minutes(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Time-tracking layout: drops the hours segment below one hour, e.g. `5m`, `1h 5m`.
pub fn format_compact(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Running-timer readout, `HH:MM:SS`.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};

    use crate::models::{ActiveTimer, Category, TimeEntry};

    use super::{
        category_totals, format_clock, format_compact, format_hours_minutes, summarize,
        today_total, total_for_range, week_total,
    };

    fn entry(end: chrono::DateTime<Utc>, duration: i64, category: Category) -> TimeEntry {
        TimeEntry {
            id: end.timestamp_millis(),
            description: "session".to_string(),
            category,
            goal_id: None,
            start_time: end - Duration::seconds(duration),
            end_time: end,
            duration,
        }
    }

    #[test]
    fn splits_today_from_yesterday() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 18, 0, 0).unwrap();
        let entries = vec![
            entry(Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap(), 3600, Category::Work),
            entry(Utc.with_ymd_and_hms(2026, 10, 13, 20, 0, 0).unwrap(), 1800, Category::Health),
        ];

        assert_eq!(today_total(&entries, None, &now), 3600);
        let yesterday_start = Utc.with_ymd_and_hms(2026, 10, 13, 0, 0, 0).unwrap();
        let today_start = Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap();
        assert_eq!(total_for_range(&entries, yesterday_start, today_start), 1800);
    }

    #[test]
    fn range_end_is_exclusive() {
        let boundary = Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap();
        let entries = vec![entry(boundary, 600, Category::Work)];
        assert_eq!(total_for_range(&entries, boundary - Duration::days(1), boundary), 0);
        assert_eq!(total_for_range(&entries, boundary, boundary + Duration::days(1)), 600);
    }

    #[test]
    fn running_timer_counts_toward_today_and_week() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 18, 0, 0).unwrap();
        let timer = ActiveTimer {
            start_time: now - Duration::seconds(125),
            description: String::new(),
            category: Category::Work,
            goal_id: None,
        };
        let entries = vec![entry(Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap(), 3600, Category::Work)];

        let summary = summarize(&entries, Some(&timer), &now);
        assert_eq!(summary.today_seconds, 3725);
        assert_eq!(summary.week_seconds, 3725);
    }

    #[test]
    fn week_includes_an_entry_ending_exactly_at_sunday_midnight() {
        let zone = FixedOffset::east_opt(2 * 3600).expect("offset");
        let wednesday = zone
            .with_ymd_and_hms(2026, 10, 14, 12, 0, 0)
            .single()
            .expect("valid time");
        let sunday_midnight = zone
            .with_ymd_and_hms(2026, 10, 11, 0, 0, 0)
            .single()
            .expect("valid time")
            .with_timezone(&Utc);

        let entries = vec![
            entry(sunday_midnight, 900, Category::Learning),
            entry(sunday_midnight - Duration::seconds(1), 300, Category::Learning),
        ];
        assert_eq!(week_total(&entries, None, &wednesday), 900);
    }

    #[test]
    fn category_totals_sort_largest_first() {
        let day = Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap();
        let entries = vec![
            entry(day + Duration::hours(9), 600, Category::Health),
            entry(day + Duration::hours(10), 1200, Category::Work),
            entry(day + Duration::hours(11), 600, Category::Learning),
            entry(day + Duration::hours(12), 300, Category::Work),
        ];

        let totals = category_totals(&entries, day, day + Duration::days(1));
        assert_eq!(
            totals,
            vec![
                (Category::Work, 1500),
                (Category::Health, 600),
                (Category::Learning, 600),
            ]
        );
    }

    #[test]
    fn the_two_duration_layouts_differ_below_an_hour() {
        assert_eq!(format_hours_minutes(125), "0h 2m");
        assert_eq!(format_compact(125), "2m");
        assert_eq!(format_hours_minutes(3_725), "1h 2m");
        assert_eq!(format_compact(3_725), "1h 2m");
        assert_eq!(format_compact(0), "0m");
        assert_eq!(format_clock(3_725), "01:02:05");
    }
}
