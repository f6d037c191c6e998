//! Drives the auth slice from API calls and the persisted session token.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use shared::{
    domain::{AuthStatus, User},
    protocol::{AuthResponse, LoginRequest, RegisterRequest},
};
use tracing::{info, warn};

use crate::{
    api::CalendarApi,
    session::{load_token, store_token, SessionRepository},
    store::{AuthAction, AuthState, CalendarAction, CalendarState, Store},
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credentials are not valid";

#[derive(Clone)]
pub struct AuthSession {
    api: Arc<CalendarApi>,
    session: Arc<dyn SessionRepository>,
    auth: Arc<Store<AuthState>>,
    calendar: Arc<Store<CalendarState>>,
    error_clear_delay: Option<Duration>,
}

impl AuthSession {
    pub fn new(
        api: Arc<CalendarApi>,
        session: Arc<dyn SessionRepository>,
        auth: Arc<Store<AuthState>>,
        calendar: Arc<Store<CalendarState>>,
    ) -> Self {
        Self {
            api,
            session,
            auth,
            calendar,
            error_clear_delay: None,
        }
    }

    /// Clears a failed login/register message after `delay`; `None` keeps it
    /// until the next transition.
    pub fn with_error_clear_delay(mut self, delay: Option<Duration>) -> Self {
        self.error_clear_delay = delay;
        self
    }

    pub fn snapshot(&self) -> AuthState {
        self.auth.snapshot()
    }

    pub fn status(&self) -> AuthStatus {
        self.auth.select(|state| state.status)
    }

    pub fn user(&self) -> Option<User> {
        self.auth.select(|state| state.user.clone())
    }

    pub fn error_message(&self) -> Option<String> {
        self.auth.select(|state| state.error_message.clone())
    }

    pub async fn check_auth_token(&self) -> Result<()> {
        let token = load_token(self.session.as_ref())
            .await
            .context("failed to read persisted session token")?;
        if token.is_none() {
            info!("no persisted session token");
            self.auth.dispatch(AuthAction::Logout(None));
            return Ok(());
        }

        match self.api.renew().await {
            Ok(response) => self.complete_login(&response).await,
            Err(err) => {
                warn!(error = %err, "persisted session token was not renewed");
                self.auth.dispatch(AuthAction::Logout(None));
                self.session
                    .clear()
                    .await
                    .context("failed to clear rejected session token")
            }
        }
    }

    pub async fn start_login(&self, credentials: &LoginRequest) -> Result<()> {
        self.auth.dispatch(AuthAction::Checking);
        match self.api.login(credentials).await {
            Ok(response) => self.complete_login(&response).await,
            Err(err) => {
                warn!(email = %credentials.email, error = %err, "login failed");
                let message = if err.is_rejection() {
                    INVALID_CREDENTIALS_MESSAGE.to_string()
                } else {
                    err.user_message()
                };
                self.fail(message);
                Ok(())
            }
        }
    }

    pub async fn start_register(&self, new_user: &RegisterRequest) -> Result<()> {
        self.auth.dispatch(AuthAction::Checking);
        match self.api.register(new_user).await {
            Ok(response) => self.complete_login(&response).await,
            Err(err) => {
                warn!(email = %new_user.email, error = %err, "registration failed");
                self.fail(err.user_message());
                Ok(())
            }
        }
    }

    pub async fn start_logout(&self) -> Result<()> {
        let cleared = self.session.clear().await;
        self.calendar.dispatch(CalendarAction::LogoutCalendar);
        self.auth.dispatch(AuthAction::Logout(None));
        info!("signed out");
        cleared.context("failed to clear persisted session")
    }

    async fn complete_login(&self, response: &AuthResponse) -> Result<()> {
        if let Err(err) = store_token(self.session.as_ref(), &response.token, Utc::now()).await {
            self.auth.dispatch(AuthAction::Logout(None));
            return Err(err.context("failed to persist session token"));
        }
        let user = response.user();
        info!(uid = %user.uid, name = %user.name, "authenticated");
        self.auth.dispatch(AuthAction::Login(user));
        Ok(())
    }

    fn fail(&self, message: String) {
        self.auth.dispatch(AuthAction::Logout(Some(message.clone())));
        let Some(delay) = self.error_clear_delay else {
            return;
        };
        let auth = Arc::clone(&self.auth);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Leave a newer failure's message alone.
            if auth.select(|state| state.error_message.as_deref() == Some(message.as_str())) {
                auth.dispatch(AuthAction::ClearErrorMessage);
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/auth_session_tests.rs"]
mod tests;
