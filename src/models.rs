use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{InsertOrder, Record, RecordId};

pub const TIME_ENTRIES: &str = "time_entries";
pub const ACTIVE_TIMER: &str = "active_timer";
pub const GOALS: &str = "goals";
pub const PROJECTS: &str = "projects";
pub const CALENDAR_EVENTS: &str = "calendar_events";
pub const ACTIVITY_LOG: &str = "activity_log";
pub const JOURNAL_ENTRIES: &str = "journal_entries";
pub const MONTHLY_REVIEWS: &str = "monthly_reviews";
pub const INTENTION_PREFIX: &str = "intention_";

pub const DEFAULT_SESSION_DESCRIPTION: &str = "Work session";

/// Category shared by time entries and calendar events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Learning,
    Personal,
    Health,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Learning,
        Category::Personal,
        Category::Health,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Learning => "learning",
            Category::Personal => "personal",
            Category::Health => "health",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: {raw}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Personal,
    Projects,
    Learning,
    Business,
}

impl GoalType {
    pub fn label(self) -> &'static str {
        match self {
            GoalType::Personal => "Personal",
            GoalType::Projects => "Projects",
            GoalType::Learning => "Learning",
            GoalType::Business => "Business",
        }
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "personal" => Ok(GoalType::Personal),
            "projects" => Ok(GoalType::Projects),
            "learning" => Ok(GoalType::Learning),
            "business" => Ok(GoalType::Business),
            _ => Err(format!("unknown goal type: {raw}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: RecordId,
    pub description: String,
    pub category: Category,
    #[serde(default, with = "optional_id")]
    pub goal_id: Option<RecordId>,
    #[serde(with = "iso_millis")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_time: DateTime<Utc>,
    /// Whole seconds, fixed when the entry is created.
    pub duration: i64,
}

impl TimeEntry {
    /// Builds a finished entry; the duration is the floor of the elapsed seconds, never negative.
    pub fn completed(
        description: String,
        category: Category,
        goal_id: Option<RecordId>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            description,
            category,
            goal_id,
            start_time,
            end_time,
            duration: elapsed_seconds(start_time, end_time),
        }
    }
}

impl Record for TimeEntry {
    const NAMESPACE: &'static str = TIME_ENTRIES;
    const ENTITY: &'static str = "time entry";
    const ORDER: InsertOrder = InsertOrder::NewestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    #[serde(with = "iso_millis")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default, with = "optional_id")]
    pub goal_id: Option<RecordId>,
}

impl ActiveTimer {
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        elapsed_seconds(self.start_time, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: GoalType,
    #[serde(default, with = "optional_text")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub progress: u8,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_completed(&self) -> bool {
        self.progress >= 100
    }
}

impl Record for Goal {
    const NAMESPACE: &'static str = GOALS;
    const ENTITY: &'static str = "goal";
    const ORDER: InsertOrder = InsertOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Opaque task records; only their count is shown.
    #[serde(default)]
    pub tasks: Vec<serde_json::Value>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Record for Project {
    const NAMESPACE: &'static str = PROJECTS;
    const ENTITY: &'static str = "project";
    const ORDER: InsertOrder = InsertOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: RecordId,
    #[serde(with = "date_string")]
    pub date: NaiveDate,
    pub title: String,
    pub category: Category,
    #[serde(default, with = "optional_text")]
    pub time: Option<String>,
}

impl Record for CalendarEvent {
    const NAMESPACE: &'static str = CALENDAR_EVENTS;
    const ENTITY: &'static str = "calendar event";
    const ORDER: InsertOrder = InsertOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: RecordId,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Record for ActivityEntry {
    const NAMESPACE: &'static str = ACTIVITY_LOG;
    const ENTITY: &'static str = "activity";
    const ORDER: InsertOrder = InsertOrder::NewestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl Record for JournalEntry {
    const NAMESPACE: &'static str = JOURNAL_ENTRIES;
    const ENTITY: &'static str = "journal entry";
    const ORDER: InsertOrder = InsertOrder::NewestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// One month's reflection. Mood and energy are keyed by the `toDateString` of the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyReview {
    pub went_well: String,
    pub didnt_go_well: String,
    pub reflection: String,
    pub focus: String,
    pub mood: BTreeMap<String, String>,
    pub energy: BTreeMap<String, u8>,
}

pub type MonthlyReviews = BTreeMap<String, MonthlyReview>;

pub fn intention_key(date: NaiveDate) -> String {
    format!("{INTENTION_PREFIX}{}", crate::dates::date_string(date))
}

pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

/// ISO8601 with millisecond precision and a `Z` suffix, the layout of `toISOString`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

mod date_string {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::dates::date_string(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::dates::parse_date_string(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognised date: {raw}")))
    }
}

/// Goal references arrive as numbers, numeric strings, `""` or `null`.
mod optional_id {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use serde_json::Value;

    use crate::repository::RecordId;

    pub fn serialize<S: Serializer>(value: &Option<RecordId>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_i64(*id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RecordId>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid id: {number}"))),
            Value::String(raw) if raw.trim().is_empty() => Ok(None),
            Value::String(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid id: {raw}"))),
            other => Err(D::Error::custom(format!("invalid id: {other}"))),
        }
    }
}

/// Optional text where an empty string means "not set".
mod optional_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|text| !text.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{ActiveTimer, CalendarEvent, Category, Goal, TimeEntry, intention_key};

    #[test]
    fn reads_records_written_by_the_browser() {
        let raw = r#"{
            "id": 1760000000000,
            "description": "Deep work",
            "category": "work",
            "goalId": "1759999999999",
            "startTime": "2026-10-14T09:00:00.000Z",
            "endTime": "2026-10-14T10:30:00.000Z",
            "duration": 5400
        }"#;
        let entry: TimeEntry = serde_json::from_str(raw).expect("entry should parse");
        assert_eq!(entry.goal_id, Some(1_759_999_999_999));
        assert_eq!(entry.duration, 5400);

        let timer: ActiveTimer = serde_json::from_str(
            r#"{"startTime":"2026-10-14T09:00:00.000Z","description":"","category":"learning","goalId":""}"#,
        )
        .expect("timer should parse");
        assert_eq!(timer.goal_id, None);
        assert_eq!(timer.category, Category::Learning);

        let goal: Goal = serde_json::from_str(
            r#"{"id":1,"title":"Run","type":"personal","deadline":"","progress":40,"createdAt":"2026-10-01T08:00:00.000Z"}"#,
        )
        .expect("goal should parse");
        assert_eq!(goal.deadline, None);
        assert!(!goal.is_completed());
    }

    #[test]
    fn writes_browser_shaped_json() {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 14, 9, 2, 5).unwrap();
        let mut entry = TimeEntry::completed("Wrote spec".to_string(), Category::Work, None, start, end);
        entry.id = 7;

        let json = serde_json::to_string(&entry).expect("encode");
        assert_eq!(
            json,
            r#"{"id":7,"description":"Wrote spec","category":"work","goalId":null,"startTime":"2026-10-14T09:00:00.000Z","endTime":"2026-10-14T09:02:05.000Z","duration":125}"#
        );
    }

    #[test]
    fn duration_is_floored_and_never_negative() {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        let end = start + chrono::Duration::milliseconds(61_999);
        assert_eq!(TimeEntry::completed(String::new(), Category::Work, None, start, end).duration, 61);
        assert_eq!(TimeEntry::completed(String::new(), Category::Work, None, end, start).duration, 0);
    }

    #[test]
    fn calendar_dates_use_the_date_string_layout() {
        let event = CalendarEvent {
            id: 3,
            date: NaiveDate::from_ymd_opt(2026, 10, 4).expect("date"),
            title: "Dentist".to_string(),
            category: Category::Health,
            time: Some("14:30".to_string()),
        };
        let json = serde_json::to_value(&event).expect("encode");
        assert_eq!(json["date"], "Sun Oct 04 2026");

        let parsed: CalendarEvent = serde_json::from_value(json).expect("decode");
        assert_eq!(parsed, event);
        assert_eq!(
            intention_key(NaiveDate::from_ymd_opt(2026, 10, 4).expect("date")),
            "intention_Sun Oct 04 2026"
        );
    }

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Health".parse::<Category>(), Ok(Category::Health));
        assert!("chores".parse::<Category>().is_err());
    }
}
