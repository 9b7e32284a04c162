use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload stored under each session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPayload {
    pub customer_id: String,
    pub created_at: String,
}

/// A store outage is a distinct failure mode: callers must not confuse
/// "backend unreachable" with "not authenticated".
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Token-keyed key/value store for live sessions.
///
/// Entries are independent; per-key atomicity is all that is required.
/// Implementations may expire entries on their own schedule; `delete` is
/// a no-op for absent tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, token: &str, payload: SessionPayload) -> Result<(), SessionStoreError>;
    async fn get(&self, token: &str) -> Result<Option<SessionPayload>, SessionStoreError>;
    async fn delete(&self, token: &str) -> Result<(), SessionStoreError>;
}

/// In-process session store backed by a concurrent hash map.
///
/// Suitable for single-node deployments and tests; the trait is the seam
/// for an external store when sessions must survive restarts.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, SessionPayload>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, token: &str, payload: SessionPayload) -> Result<(), SessionStoreError> {
        self.entries.insert(token.to_string(), payload);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<SessionPayload>, SessionStoreError> {
        Ok(self.entries.get(token).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, token: &str) -> Result<(), SessionStoreError> {
        self.entries.remove(token);
        Ok(())
    }
}

/// Store stub whose every call fails, for outage propagation tests.
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
#[async_trait]
impl SessionStore for FailingStore {
    async fn set(&self, _: &str, _: SessionPayload) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _: &str) -> Result<Option<SessionPayload>, SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _: &str) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }
}
