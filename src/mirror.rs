use crate::aggregate::format_compact;
use crate::models::{ActivityEntry, TimeEntry};

/// The activity-log record written alongside a completed time entry. The id is assigned when
/// the record is stored.
pub fn activity_for(entry: &TimeEntry) -> ActivityEntry {
    ActivityEntry {
        id: 0,
        description: format!("{} ({})", entry.description, format_compact(entry.duration)),
        tags: vec![entry.category.to_string()],
        timestamp: entry.end_time,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::{Category, TimeEntry};

    use super::activity_for;

    #[test]
    fn mirrors_description_duration_and_category() {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        let end = start + Duration::seconds(4_000);
        let entry = TimeEntry::completed("Planning".to_string(), Category::Learning, None, start, end);

        let activity = activity_for(&entry);
        assert_eq!(activity.description, "Planning (1h 6m)");
        assert_eq!(activity.tags, vec!["learning".to_string()]);
        assert_eq!(activity.timestamp, end);
    }
}
