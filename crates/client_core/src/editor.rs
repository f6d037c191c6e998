//! Date modal state and the event form flow built on top of it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shared::domain::CalendarEvent;
use tracing::debug;

use crate::{
    event_persistence::{CalendarError, EventPersistence},
    form::EventDraft,
    store::{Store, UiAction, UiState},
};

#[derive(Clone)]
pub struct UiModal {
    ui: Arc<Store<UiState>>,
}

impl UiModal {
    pub fn new(ui: Arc<Store<UiState>>) -> Self {
        Self { ui }
    }

    pub fn is_date_modal_open(&self) -> bool {
        self.ui.select(|state| state.is_date_modal_open)
    }

    pub fn open_date_modal(&self) {
        self.ui.dispatch(UiAction::OpenDateModal);
    }

    pub fn close_date_modal(&self) {
        self.ui.dispatch(UiAction::CloseDateModal);
    }
}

/// Length of the draft created by "add new event".
pub fn new_event_length() -> Duration {
    Duration::hours(2)
}

/// Length of the form shown when nothing is selected.
pub fn default_form_length() -> Duration {
    Duration::hours(1)
}

#[derive(Clone)]
pub struct EventEditor {
    modal: UiModal,
    events: EventPersistence,
}

impl EventEditor {
    pub fn new(modal: UiModal, events: EventPersistence) -> Self {
        Self { modal, events }
    }

    pub fn modal(&self) -> &UiModal {
        &self.modal
    }

    pub fn open_new_event(&self, now: DateTime<Utc>) -> EventDraft {
        let draft = EventDraft::blank(now, new_event_length());
        self.events.set_active_event(draft.clone());
        self.modal.open_date_modal();
        draft
    }

    pub fn open_event(&self, event: CalendarEvent) {
        debug!(id = %event.id, "editing event");
        self.events.set_active_event(event);
        self.modal.open_date_modal();
    }

    pub fn form_values(&self, now: DateTime<Utc>) -> EventDraft {
        self.events
            .active_event()
            .unwrap_or_else(|| EventDraft::blank(now, default_form_length()))
    }

    /// Saves the draft and closes the modal. On failure the modal stays open
    /// so the form can be corrected.
    pub async fn submit(&self, draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
        let saved = self.events.start_saving_event(draft).await?;
        self.modal.close_date_modal();
        Ok(saved)
    }

    pub fn close(&self) {
        self.modal.close_date_modal();
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
