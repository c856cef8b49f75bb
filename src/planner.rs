use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, require_text};
use crate::models::{CalendarEvent, Category, Goal, GoalType, Project};
use crate::repository::RecordId;
use crate::store::KeyedStore;
use crate::workspace::Workspace;

pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub kind: GoalType,
    pub deadline: Option<String>,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub date: NaiveDate,
    pub title: String,
    pub category: Category,
    pub time: Option<String>,
}

impl<S: KeyedStore> Workspace<S> {
    pub fn goals(&self) -> Vec<Goal> {
        self.list()
    }

    pub fn add_goal(&mut self, now: DateTime<Utc>, goal: NewGoal) -> Result<Goal, AppError> {
        let title = require_text("title", &goal.title)?;
        let progress = validate_progress(goal.progress)?;
        let goal = Goal {
            id: 0,
            title,
            kind: goal.kind,
            deadline: goal.deadline.filter(|deadline| !deadline.trim().is_empty()),
            progress,
            created_at: now,
        };
        self.repository().create(now, goal)
    }

    pub fn set_goal_progress(&mut self, id: RecordId, progress: u8) -> Result<Goal, AppError> {
        let progress = validate_progress(progress)?;
        self.repository::<Goal>()
            .update(id, |goal| goal.progress = progress)
    }

    pub fn remove_goal(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<Goal>().remove(id)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.list()
    }

    pub fn add_project(
        &mut self,
        now: DateTime<Utc>,
        title: &str,
        description: &str,
    ) -> Result<Project, AppError> {
        let project = Project {
            id: 0,
            title: require_text("title", title)?,
            description: description.to_string(),
            tasks: Vec::new(),
            created_at: now,
        };
        self.repository().create(now, project)
    }

    pub fn remove_project(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<Project>().remove(id)
    }

    pub fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.list()
    }

    pub fn add_event(&mut self, now: DateTime<Utc>, event: NewEvent) -> Result<CalendarEvent, AppError> {
        let title = require_text("title", &event.title)?;
        let time = match event.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(time) => Some(validate_time_format(time)?.to_string()),
        };

        let event = CalendarEvent {
            id: 0,
            date: event.date,
            title,
            category: event.category,
            time,
        };
        self.repository().create(now, event)
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.calendar_events()
            .into_iter()
            .filter(|event| event.date == date)
            .collect()
    }

    pub fn remove_event(&mut self, id: RecordId) -> Result<bool, AppError> {
        self.repository::<CalendarEvent>().remove(id)
    }
}

pub fn active_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals.iter().filter(|goal| !goal.is_completed()).collect()
}

pub fn completed_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals.iter().filter(|goal| goal.is_completed()).collect()
}

fn validate_progress(progress: u8) -> Result<u8, AppError> {
    if progress > MAX_PROGRESS {
        return Err(AppError::invalid(
            "progress",
            format!("must be between 0 and {MAX_PROGRESS}, got {progress}"),
        ));
    }
    Ok(progress)
}

/// Validate time format (HH:MM, 24-hour).
pub fn validate_time_format(time: &str) -> Result<&str, AppError> {
    let err = |reason: &str| AppError::invalid("time", reason);

    let Some((hours, minutes)) = time.split_once(':') else {
        return Err(err("must be in HH:MM format"));
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(err("must be in HH:MM format"));
    }

    let hours: u32 = hours.parse().map_err(|_| err("invalid hours"))?;
    let minutes: u32 = minutes.parse().map_err(|_| err("invalid minutes"))?;
    if hours >= 24 {
        return Err(err("hours must be 00-23"));
    }
    if minutes >= 60 {
        return Err(err("minutes must be 00-59"));
    }

    Ok(time)
}
