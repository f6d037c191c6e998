//! Drives the calendar slice from event CRUD calls against the API.

use std::sync::Arc;

use shared::domain::{CalendarEvent, User};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    alerts::{Alert, AlertContext, AlertSink},
    api::{ApiClientError, CalendarApi},
    form::{EventDraft, ValidationError},
    store::{AuthState, CalendarAction, CalendarState, Store},
};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no saved event is selected")]
    NoActiveEvent,
    #[error("failed to {action} event: {source}")]
    Api {
        action: &'static str,
        #[source]
        source: ApiClientError,
    },
}

#[derive(Clone)]
pub struct EventPersistence {
    api: Arc<CalendarApi>,
    auth: Arc<Store<AuthState>>,
    calendar: Arc<Store<CalendarState>>,
    alerts: AlertSink,
}

impl EventPersistence {
    pub fn new(
        api: Arc<CalendarApi>,
        auth: Arc<Store<AuthState>>,
        calendar: Arc<Store<CalendarState>>,
        alerts: AlertSink,
    ) -> Self {
        Self {
            api,
            auth,
            calendar,
            alerts,
        }
    }

    pub fn snapshot(&self) -> CalendarState {
        self.calendar.snapshot()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.calendar.select(|state| state.events.clone())
    }

    pub fn active_event(&self) -> Option<EventDraft> {
        self.calendar.select(|state| state.active_event.clone())
    }

    pub fn has_event_selected(&self) -> bool {
        self.calendar.select(CalendarState::has_event_selected)
    }

    pub fn set_active_event(&self, event: impl Into<EventDraft>) {
        self.calendar
            .dispatch(CalendarAction::SetActiveEvent(event.into()));
    }

    pub async fn start_loading_events(&self) -> Result<(), CalendarError> {
        self.calendar.dispatch(CalendarAction::StartLoadingEvents);
        match self.api.list_events().await {
            Ok(events) => {
                info!(count = events.len(), "events loaded");
                self.calendar.dispatch(CalendarAction::LoadEvents(events));
                Ok(())
            }
            Err(err) => {
                self.calendar.dispatch(CalendarAction::LoadingFailed);
                Err(self.report(AlertContext::LoadEvents, "load", err))
            }
        }
    }

    /// Creates the event when the draft has no id, updates it otherwise.
    /// Nothing in the store changes unless the server accepted the write.
    pub async fn start_saving_event(&self, draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
        if let Err(err) = draft.validate() {
            warn!(error = %err, "event form rejected");
            self.alerts.publish(Alert::from_validation(err));
            return Err(err.into());
        }

        let payload = draft.payload();
        match draft.id.clone() {
            Some(id) => {
                if let Err(err) = self.api.update_event(&id, &payload).await {
                    return Err(self.report(AlertContext::SaveEvent, "update", err));
                }
                let owner = draft.user.clone().or_else(|| self.current_user());
                let event = draft.into_event(id, owner);
                info!(id = %event.id, "event updated");
                self.calendar
                    .dispatch(CalendarAction::UpdateEvent(event.clone()));
                Ok(event)
            }
            None => {
                let created = match self.api.create_event(&payload).await {
                    Ok(created) => created,
                    Err(err) => return Err(self.report(AlertContext::SaveEvent, "create", err)),
                };
                let owner = self.current_user().or(created.user);
                let event = draft.into_event(created.id, owner);
                info!(id = %event.id, "event created");
                self.calendar
                    .dispatch(CalendarAction::AddNewEvent(event.clone()));
                Ok(event)
            }
        }
    }

    pub async fn start_deleting_event(&self) -> Result<(), CalendarError> {
        let Some(id) = self
            .calendar
            .select(|state| state.active_event.as_ref().and_then(|event| event.id.clone()))
        else {
            return Err(CalendarError::NoActiveEvent);
        };

        if let Err(err) = self.api.delete_event(&id).await {
            return Err(self.report(AlertContext::DeleteEvent, "delete", err));
        }
        info!(id = %id, "event deleted");
        self.calendar.dispatch(CalendarAction::DeleteEvent(id));
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.auth.select(|state| state.user.clone())
    }

    fn report(
        &self,
        context: AlertContext,
        action: &'static str,
        source: ApiClientError,
    ) -> CalendarError {
        self.alerts.publish(Alert::from_api(context, &source));
        CalendarError::Api { action, source }
    }
}

#[cfg(test)]
#[path = "tests/event_persistence_tests.rs"]
mod tests;
