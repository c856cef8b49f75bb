use chrono::{DateTime, Utc};

use crate::error::{AppError, require_text};
use crate::models::{ActivityEntry, JournalEntry};
use crate::repository::RecordId;
use crate::store::KeyedStore;
use crate::workspace::Workspace;

impl<S: KeyedStore> Workspace<S> {
    pub fn activities(&self) -> Vec<ActivityEntry> {
        self.list()
    }

    pub fn add_activity(
        &mut self,
        now: DateTime<Utc>,
        description: &str,
        tags: Vec<String>,
    ) -> Result<ActivityEntry, AppError> {
        let activity = ActivityEntry {
            id: 0,
            description: require_text("description", description)?,
            tags,
            timestamp: now,
        };
        self.repository().create(now, activity)
    }

    pub fn remove_activity(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<ActivityEntry>().remove(id)
    }

    /// Case-insensitive match on the description or any tag. A blank query matches everything.
    pub fn search_activities(&self, query: &str) -> Vec<ActivityEntry> {
        let query = query.trim().to_lowercase();
        self.activities()
            .into_iter()
            .filter(|activity| {
                query.is_empty()
                    || activity.description.to_lowercase().contains(&query)
                    || activity
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.list()
    }

    pub fn add_journal_entry(
        &mut self,
        now: DateTime<Utc>,
        title: &str,
        content: &str,
    ) -> Result<JournalEntry, AppError> {
        let entry = JournalEntry {
            id: 0,
            title: require_text("title", title)?,
            content: require_text("content", content)?,
            created_at: now,
            updated_at: now,
        };
        self.repository().create(now, entry)
    }

    pub fn update_journal_entry(
        &mut self,
        now: DateTime<Utc>,
        id: RecordId,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<JournalEntry, AppError> {
        self.repository::<JournalEntry>().update(id, |entry| {
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(content) = content {
                entry.content = content;
            }
            entry.updated_at = now;
        })
    }

    pub fn delete_journal_entry(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<JournalEntry>().remove(id)
    }

    pub fn search_journal(&self, query: &str) -> Vec<JournalEntry> {
        let query = query.trim().to_lowercase();
        self.journal_entries()
            .into_iter()
            .filter(|entry| {
                query.is_empty()
                    || entry.title.to_lowercase().contains(&query)
                    || entry.content.to_lowercase().contains(&query)
            })
            .collect()
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::error::AppError;
    use crate::test_utils::{at, memory_workspace};

    use super::parse_tags;

    #[test]
    fn parses_comma_separated_tags() {
        assert_eq!(parse_tags(" focus, deep work ,,"), vec!["focus", "deep work"]);
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn activities_are_newest_first_and_searchable_by_tag() {
        let mut workspace = memory_workspace();
        let now = at(2026, 10, 14, 9, 0, 0);
        workspace
            .add_activity(now, "Morning run", parse_tags("health"))
            .expect("add activity");
        workspace
            .add_activity(now + Duration::hours(1), "Inbox zero", parse_tags("admin, Work"))
            .expect("add activity");

        let activities = workspace.activities();
        assert_eq!(activities[0].description, "Inbox zero");
        assert_eq!(workspace.search_activities("work").len(), 1);
        assert_eq!(workspace.search_activities("RUN").len(), 1);
        assert_eq!(workspace.search_activities("").len(), 2);
        assert!(matches!(
            workspace.add_activity(now, "", Vec::new()),
            Err(AppError::InvalidInput { .. })
        ));
    }

    #[test]
    fn editing_a_journal_entry_refreshes_updated_at() {
        let mut workspace = memory_workspace();
        let created = at(2026, 10, 14, 9, 0, 0);
        let entry = workspace
            .add_journal_entry(created, "Day one", "# Hello")
            .expect("add entry");
        assert_eq!(entry.updated_at, created);

        let edited_at = created + Duration::hours(3);
        let edited = workspace
            .update_journal_entry(edited_at, entry.id, None, Some("# Hello again".to_string()))
            .expect("edit entry");
        assert_eq!(edited.title, "Day one");
        assert_eq!(edited.content, "# Hello again");
        assert_eq!(edited.created_at, created);
        assert_eq!(edited.updated_at, edited_at);

        assert_eq!(workspace.search_journal("again").len(), 1);
        assert!(workspace.delete_journal_entry(entry.id).expect("delete"));
        assert!(workspace.journal_entries().is_empty());
    }

    #[test]
    fn journal_entries_need_title_and_content() {
        let mut workspace = memory_workspace();
        let now = at(2026, 10, 14, 9, 0, 0);
        assert!(workspace.add_journal_entry(now, "Title", " ").is_err());
        assert!(workspace.add_journal_entry(now, "", "Body").is_err());
    }
}
