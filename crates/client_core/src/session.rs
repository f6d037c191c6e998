//! Persisted session values: the API token and the moment it was issued.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storage::Storage;
use tokio::sync::Mutex;

pub const TOKEN_KEY: &str = "token";
pub const TOKEN_INIT_DATE_KEY: &str = "token-init-date";

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionRepository {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values.lock().await.clear();
        Ok(())
    }
}

/// Session values kept in the SQLite session database.
pub struct DurableSessionRepository {
    storage: Storage,
}

impl DurableSessionRepository {
    pub async fn open(database_url: &str) -> Result<Self> {
        Ok(Self::new(Storage::new(database_url).await?))
    }

    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SessionRepository for DurableSessionRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_value(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_value(key, value).await
    }

    async fn clear(&self) -> Result<()> {
        self.storage.clear_values().await?;
        Ok(())
    }
}

pub async fn load_token(repository: &dyn SessionRepository) -> Result<Option<String>> {
    Ok(repository
        .get(TOKEN_KEY)
        .await?
        .filter(|token| !token.is_empty()))
}

/// Stores `token` with its issue time in epoch milliseconds.
pub async fn store_token(
    repository: &dyn SessionRepository,
    token: &str,
    issued_at: DateTime<Utc>,
) -> Result<()> {
    repository.set(TOKEN_KEY, token).await?;
    repository
        .set(TOKEN_INIT_DATE_KEY, &issued_at.timestamp_millis().to_string())
        .await
}

pub async fn token_issued_at(repository: &dyn SessionRepository) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = repository.get(TOKEN_INIT_DATE_KEY).await? else {
        return Ok(None);
    };
    Ok(raw
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis))
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
