use chrono::{DateTime, TimeZone, Utc};

use crate::aggregate::{TimeSummary, category_totals, summarize};
use crate::error::{AppError, require_text};
use crate::mirror::activity_for;
use crate::models::{
    ACTIVE_TIMER, ActiveTimer, ActivityEntry, Category, DEFAULT_SESSION_DESCRIPTION, TimeEntry,
};
use crate::repository::{Record, RecordId, encode, load_value, save_value, stage};
use crate::store::{KeyedStore, UnitOfWork};
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq)]
pub struct TimerDraft {
    pub description: String,
    pub category: Category,
    pub goal_id: Option<RecordId>,
}

impl Default for TimerDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: Category::Work,
            goal_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub description: String,
    pub category: Category,
    pub goal_id: Option<RecordId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A stored time entry together with the activity record mirrored from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub entry: TimeEntry,
    pub activity: ActivityEntry,
}

impl<S: KeyedStore> Workspace<S> {
    pub fn active_timer(&self) -> Option<ActiveTimer> {
        load_value(&self.store, ACTIVE_TIMER)
    }

    pub fn time_entries(&self) -> Vec<TimeEntry> {
        self.list()
    }

    pub fn start_timer(&mut self, now: DateTime<Utc>, draft: TimerDraft) -> Result<ActiveTimer, AppError> {
        if let Some(running) = self.active_timer() {
            return Err(AppError::TimerAlreadyRunning {
                started_at: running.start_time,
            });
        }

        let timer = ActiveTimer {
            start_time: now,
            description: draft.description,
            category: draft.category,
            goal_id: draft.goal_id,
        };
        save_value(&mut self.store, ACTIVE_TIMER, &timer)?;
        log::info!("timer started at {now}");
        Ok(timer)
    }

    /// Edits the running timer in place; its start time is kept.
    pub fn update_active_timer(
        &mut self,
        edit: impl FnOnce(&mut TimerDraft),
    ) -> Result<ActiveTimer, AppError> {
        let mut timer = self.active_timer().ok_or(AppError::NoActiveTimer)?;
        let mut draft = TimerDraft {
            description: timer.description.clone(),
            category: timer.category,
            goal_id: timer.goal_id,
        };
        edit(&mut draft);

        timer.description = draft.description;
        timer.category = draft.category;
        timer.goal_id = draft.goal_id;
        save_value(&mut self.store, ACTIVE_TIMER, &timer)?;
        Ok(timer)
    }

    /// Turns the running timer into a time entry. The entry, its activity record and the
    /// removal of the timer are written as one unit of work.
    pub fn stop_timer(&mut self, now: DateTime<Utc>) -> Result<Completed, AppError> {
        let timer = self.active_timer().ok_or(AppError::NoActiveTimer)?;
        let description = if timer.description.trim().is_empty() {
            DEFAULT_SESSION_DESCRIPTION.to_string()
        } else {
            timer.description
        };

        let entry = TimeEntry::completed(description, timer.category, timer.goal_id, timer.start_time, now);
        let completed = self.record_completion(now, entry, true)?;
        log::info!(
            "timer stopped after {}s, stored entry {}",
            completed.entry.duration,
            completed.entry.id
        );
        Ok(completed)
    }

    pub fn log_manual_entry(&mut self, now: DateTime<Utc>, manual: ManualEntry) -> Result<Completed, AppError> {
        let description = require_text("description", &manual.description)?;
        if manual.end <= manual.start {
            return Err(AppError::invalid("end time", "must be after the start time"));
        }

        let entry = TimeEntry::completed(description, manual.category, manual.goal_id, manual.start, manual.end);
        self.record_completion(now, entry, false)
    }

    pub fn remove_time_entry(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<TimeEntry>().remove(id)
    }

    pub fn time_summary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TimeSummary {
        summarize(&self.time_entries(), self.active_timer().as_ref(), now)
    }

    pub fn category_totals(&self, start: DateTime<Utc>, end_exclusive: DateTime<Utc>) -> Vec<(Category, i64)> {
        category_totals(&self.time_entries(), start, end_exclusive)
    }

    fn record_completion(
        &mut self,
        now: DateTime<Utc>,
        entry: TimeEntry,
        clear_timer: bool,
    ) -> Result<Completed, AppError> {
        let mut entries = self.list::<TimeEntry>();
        let mut activities = self.list::<ActivityEntry>();

        let entry = stage(&self.ids, now, entry, &mut entries)?;
        let activity = stage(&self.ids, now, activity_for(&entry), &mut activities)?;

        let mut work = UnitOfWork::new();
        work.set(TimeEntry::NAMESPACE, encode(&entries)?)
            .set(ActivityEntry::NAMESPACE, encode(&activities)?);
        if clear_timer {
            work.remove(ACTIVE_TIMER);
        }
        work.commit(&mut self.store)?;

        Ok(Completed { entry, activity })
    }
}
