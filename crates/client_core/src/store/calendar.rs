use shared::domain::{CalendarEvent, EventId};

use super::Slice;
use crate::form::EventDraft;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarState {
    pub events: Vec<CalendarEvent>,
    /// Event selected for editing. A draft without an id has not been saved.
    pub active_event: Option<EventDraft>,
    pub is_loading_events: bool,
}

impl CalendarState {
    pub fn has_event_selected(&self) -> bool {
        self.active_event.is_some()
    }

    pub fn event(&self, id: &EventId) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| &event.id == id)
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|event| &event.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarAction {
    SetActiveEvent(EventDraft),
    AddNewEvent(CalendarEvent),
    UpdateEvent(CalendarEvent),
    /// Removes the event the server deleted. The selection is cleared only
    /// if it still points at that event.
    DeleteEvent(EventId),
    StartLoadingEvents,
    LoadEvents(Vec<CalendarEvent>),
    LoadingFailed,
    LogoutCalendar,
}

impl Slice for CalendarState {
    type Action = CalendarAction;

    const NAME: &'static str = "calendar";

    fn reduce(&mut self, action: CalendarAction) {
        match action {
            CalendarAction::SetActiveEvent(draft) => {
                self.active_event = Some(draft);
            }
            CalendarAction::AddNewEvent(event) => {
                // A newer selection made while the create was in flight stays.
                if self
                    .active_event
                    .as_ref()
                    .is_some_and(|active| !active.is_saved() || active.id.as_ref() == Some(&event.id))
                {
                    self.active_event = None;
                }
                match self.position(&event.id) {
                    Some(index) => self.events[index] = event,
                    None => self.events.push(event),
                }
            }
            CalendarAction::UpdateEvent(event) => {
                if let Some(index) = self.position(&event.id) {
                    self.events[index] = event;
                }
            }
            CalendarAction::DeleteEvent(id) => {
                self.events.retain(|event| event.id != id);
                if self
                    .active_event
                    .as_ref()
                    .is_some_and(|active| active.id.as_ref() == Some(&id))
                {
                    self.active_event = None;
                }
            }
            CalendarAction::StartLoadingEvents => {
                self.is_loading_events = true;
            }
            CalendarAction::LoadEvents(events) => {
                let mut loaded: Vec<CalendarEvent> = Vec::with_capacity(events.len());
                for event in events {
                    if !loaded.iter().any(|existing| existing.id == event.id) {
                        loaded.push(event);
                    }
                }
                self.events = loaded;
                self.is_loading_events = false;
            }
            CalendarAction::LoadingFailed => {
                self.is_loading_events = false;
            }
            CalendarAction::LogoutCalendar => {
                *self = Self::default();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/calendar_tests.rs"]
mod tests;
