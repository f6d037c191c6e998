//! Event form values and the checks they must pass before being persisted.

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{CalendarEvent, EventId, User},
    protocol::EventPayload,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please check the entered dates.")]
    InvalidDates,
    #[error("The event needs a title.")]
    MissingTitle,
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::InvalidDates => "Invalid Dates",
            ValidationError::MissingTitle => "Missing Title",
        }
    }
}

/// Values of the event form. `id` is `None` until the server has stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub id: Option<EventId>,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub user: Option<User>,
}

impl EventDraft {
    pub fn blank(start: DateTime<Utc>, length: Duration) -> Self {
        Self {
            id: None,
            title: String::new(),
            notes: String::new(),
            start,
            end: start + length,
            user: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end <= self.start {
            return Err(ValidationError::InvalidDates);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }

    pub fn payload(&self) -> EventPayload {
        EventPayload {
            title: self.title.clone(),
            notes: self.notes.clone(),
            start: self.start,
            end: self.end,
        }
    }

    pub fn into_event(self, id: EventId, user: Option<User>) -> CalendarEvent {
        CalendarEvent {
            id,
            title: self.title,
            notes: self.notes,
            start: self.start,
            end: self.end,
            user: user.or(self.user),
        }
    }
}

impl From<CalendarEvent> for EventDraft {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: Some(event.id),
            title: event.title,
            notes: event.notes,
            start: event.start,
            end: event.end,
            user: event.user,
        }
    }
}
