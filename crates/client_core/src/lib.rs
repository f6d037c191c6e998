use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use shared::domain::AuthStatus;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub mod alerts;
pub mod api;
pub mod auth_session;
pub mod config;
pub mod editor;
pub mod event_persistence;
pub mod form;
pub mod session;
pub mod store;

pub use alerts::{Alert, AlertCategory, AlertSink};
pub use api::{ApiClientError, CalendarApi};
pub use auth_session::AuthSession;
pub use config::{RunMode, Settings};
pub use editor::{EventEditor, UiModal};
pub use event_persistence::{CalendarError, EventPersistence};
pub use form::{EventDraft, ValidationError};
pub use session::{DurableSessionRepository, MemorySessionRepository, SessionRepository};
pub use store::{AuthState, CalendarState, Store, UiState};

/// The stores, the session repository and the hooks that drive them, wired
/// against one API server.
pub struct CalendarApp {
    auth_store: Arc<Store<AuthState>>,
    calendar_store: Arc<Store<CalendarState>>,
    ui_store: Arc<Store<UiState>>,
    session: Arc<dyn SessionRepository>,
    alerts: AlertSink,
    auth: AuthSession,
    events: EventPersistence,
    editor: EventEditor,
}

impl CalendarApp {
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let session: Arc<dyn SessionRepository> = match settings.mode {
            RunMode::Test => {
                info!("test mode, keeping the session in memory");
                Arc::new(MemorySessionRepository::new())
            }
            RunMode::Normal => Arc::new(
                DurableSessionRepository::open(&settings.session_database_url)
                    .await
                    .with_context(|| {
                        format!(
                            "failed to open session database '{}'",
                            settings.session_database_url
                        )
                    })?,
            ),
        };
        let delay = settings.error_clear_delay_ms.map(Duration::from_millis);
        Ok(Self::with_session_repository(
            &settings.api_url,
            session,
            delay,
        )?)
    }

    pub fn with_session_repository(
        api_url: &str,
        session: Arc<dyn SessionRepository>,
        error_clear_delay: Option<Duration>,
    ) -> Result<Self, ApiClientError> {
        let api = Arc::new(CalendarApi::new(api_url, session.clone())?);
        let auth_store = Arc::new(Store::<AuthState>::new());
        let calendar_store = Arc::new(Store::<CalendarState>::new());
        let ui_store = Arc::new(Store::<UiState>::new());
        let alerts = AlertSink::new();

        let auth = AuthSession::new(
            api.clone(),
            session.clone(),
            auth_store.clone(),
            calendar_store.clone(),
        )
        .with_error_clear_delay(error_clear_delay);
        let events = EventPersistence::new(
            api,
            auth_store.clone(),
            calendar_store.clone(),
            alerts.clone(),
        );
        let editor = EventEditor::new(UiModal::new(ui_store.clone()), events.clone());

        Ok(Self {
            auth_store,
            calendar_store,
            ui_store,
            session,
            alerts,
            auth,
            events,
            editor,
        })
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn events(&self) -> &EventPersistence {
        &self.events
    }

    pub fn editor(&self) -> &EventEditor {
        &self.editor
    }

    pub fn ui(&self) -> &UiModal {
        self.editor.modal()
    }

    pub fn auth_store(&self) -> &Arc<Store<AuthState>> {
        &self.auth_store
    }

    pub fn calendar_store(&self) -> &Arc<Store<CalendarState>> {
        &self.calendar_store
    }

    pub fn ui_store(&self) -> &Arc<Store<UiState>> {
        &self.ui_store
    }

    pub fn session(&self) -> &Arc<dyn SessionRepository> {
        &self.session
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    /// Restores the persisted session and, when it is still valid, loads the
    /// user's events. A failed load is reported as an alert, not an error.
    pub async fn bootstrap(&self) -> Result<AuthStatus> {
        self.auth.check_auth_token().await?;
        let status = self.auth.status();
        if self.auth_store.select(AuthState::is_authenticated) {
            if let Err(err) = self.events.start_loading_events().await {
                warn!(error = %err, "events were not loaded during bootstrap");
            }
        }
        info!(%status, "bootstrap complete");
        Ok(status)
    }
}

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
mod mock_backend;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
