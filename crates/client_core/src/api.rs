//! HTTP client for the calendar API server.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CalendarEvent, EventId},
    error::{ApiError, ErrorBody},
    protocol::{
        AuthResponse, EventListResponse, EventPayload, EventResponse, LoginRequest,
        RegisterRequest, StatusResponse,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::session::{load_token, SessionRepository};

/// Header carrying the session token on every request.
pub const TOKEN_HEADER: &str = "x-token";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to read session token: {0}")]
    Session(anyhow::Error),
    #[error("request {method} {endpoint} failed: {source}")]
    Transport {
        method: Method,
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error(transparent)]
    Rejected(#[from] ApiError),
}

impl ApiClientError {
    /// Message fit for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiClientError::Rejected(err) => err.message.clone(),
            ApiClientError::Transport { .. } => {
                "Server unreachable; check the API URL and network, then retry.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiClientError::Rejected(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiClientError>;

pub struct CalendarApi {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionRepository>,
}

impl CalendarApi {
    pub fn new(base_url: &str, session: Arc<dyn SessionRepository>) -> ApiResult<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url)?,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    /// `events/{id}` with the id encoded as a single path segment.
    pub fn event_endpoint(&self, id: &EventId) -> ApiResult<Url> {
        let mut url = self.endpoint("events")?;
        url.path_segments_mut()
            .map_err(|()| ApiClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .push(id.as_str());
        Ok(url)
    }

    /// Builds a request and attaches the persisted token, if any.
    pub async fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        self.request_to(method, url).await
    }

    async fn request_to(&self, method: Method, url: Url) -> ApiResult<RequestBuilder> {
        let mut builder = self.http.request(method, url);
        let token = load_token(self.session.as_ref())
            .await
            .map_err(ApiClientError::Session)?;
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        debug!(%method, path, "api request");
        let response = builder
            .send()
            .await
            .map_err(|source| ApiClientError::Transport {
                method: method.clone(),
                endpoint: path.to_string(),
                source,
            })?;
        let response = reject_on_error_status(response, &method, path).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| ApiClientError::Decode {
                endpoint: path.to_string(),
                source,
            })
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse> {
        let builder = self.request(Method::POST, "auth").await?.json(credentials);
        self.send(Method::POST, "auth", builder).await
    }

    pub async fn register(&self, new_user: &RegisterRequest) -> ApiResult<AuthResponse> {
        let builder = self.request(Method::POST, "auth/new").await?.json(new_user);
        self.send(Method::POST, "auth/new", builder).await
    }

    pub async fn renew(&self) -> ApiResult<AuthResponse> {
        let builder = self.request(Method::GET, "auth/renew").await?;
        self.send(Method::GET, "auth/renew", builder).await
    }

    pub async fn list_events(&self) -> ApiResult<Vec<CalendarEvent>> {
        let builder = self.request(Method::GET, "events").await?;
        let body: EventListResponse = self.send(Method::GET, "events", builder).await?;
        Ok(body.events)
    }

    pub async fn create_event(&self, payload: &EventPayload) -> ApiResult<CalendarEvent> {
        let builder = self.request(Method::POST, "events").await?.json(payload);
        let body: EventResponse = self.send(Method::POST, "events", builder).await?;
        Ok(body.event)
    }

    pub async fn update_event(&self, id: &EventId, payload: &EventPayload) -> ApiResult<()> {
        let url = self.event_endpoint(id)?;
        let path = url.path().to_string();
        let builder = self.request_to(Method::PUT, url).await?.json(payload);
        let _: StatusResponse = self.send(Method::PUT, &path, builder).await?;
        Ok(())
    }

    pub async fn delete_event(&self, id: &EventId) -> ApiResult<()> {
        let url = self.event_endpoint(id)?;
        let path = url.path().to_string();
        let builder = self.request_to(Method::DELETE, url).await?;
        let _: StatusResponse = self.send(Method::DELETE, &path, builder).await?;
        Ok(())
    }
}

async fn reject_on_error_status(
    response: Response,
    method: &Method,
    path: &str,
) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<ErrorBody>().await.ok();
    let err = ApiError::from_response(status.as_u16(), body);
    warn!(%method, path, status = status.as_u16(), message = %err.message, "api request rejected");
    Err(err.into())
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| ApiClientError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
