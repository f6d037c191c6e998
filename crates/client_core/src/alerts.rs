//! User-visible alerts raised by the orchestration layer.

use tokio::sync::broadcast;

use shared::error::ErrorCode;

use crate::{api::ApiClientError, form::ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCategory {
    Validation,
    Auth,
    Transport,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertContext {
    LoadEvents,
    SaveEvent,
    DeleteEvent,
}

impl AlertContext {
    fn title(self) -> &'static str {
        match self {
            AlertContext::LoadEvents => "Error loading events",
            AlertContext::SaveEvent => "Error saving event",
            AlertContext::DeleteEvent => "Error deleting event",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn from_validation(err: ValidationError) -> Self {
        Self {
            category: AlertCategory::Validation,
            title: err.title().to_string(),
            message: err.to_string(),
        }
    }

    pub fn from_api(context: AlertContext, err: &ApiClientError) -> Self {
        let category = match err {
            ApiClientError::Rejected(api_err) if api_err.code == ErrorCode::Unauthorized => {
                AlertCategory::Auth
            }
            ApiClientError::Transport { .. } => AlertCategory::Transport,
            _ => AlertCategory::Server,
        };
        Self {
            category,
            title: context.title().to_string(),
            message: err.user_message(),
        }
    }
}

/// Fan-out for alerts. Publishing without subscribers is not an error.
#[derive(Clone)]
pub struct AlertSink {
    tx: broadcast::Sender<Alert>,
}

impl AlertSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn publish(&self, alert: Alert) {
        tracing::warn!(title = %alert.title, message = %alert.message, "alert");
        let _ = self.tx.send(alert);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }
}

impl Default for AlertSink {
    fn default() -> Self {
        Self::new()
    }
}
