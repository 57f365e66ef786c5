use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{CoreError, CoreResult};

/// The locally persisted identity of the currently logged-in buyer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

/// Persistence for the session user record, as plain JSON under a fixed key.
/// Absence or a corrupt record reads as logged out, never as a fatal error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self)
        -> Result<Option<SessionUser>, Box<dyn std::error::Error + Send + Sync>>;

    async fn save(
        &self,
        user: &SessionUser,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: RwLock<Option<SessionUser>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
    ) -> Result<Option<SessionUser>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.user.read().await.clone())
    }

    async fn save(
        &self,
        user: &SessionUser,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.user.write().await = Some(user.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.user.write().await = None;
        Ok(())
    }
}

/// Single writer for session state. Login and logout go through here and
/// write through to the store; everything else reads a snapshot.
pub struct AuthContext {
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<SessionUser>>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Re-read the persisted session at startup. A stored record is taken
    /// as-is; the checkout path re-validates the user id.
    pub async fn restore(&self) -> CoreResult<Option<SessionUser>> {
        let user = self
            .store
            .load()
            .await
            .map_err(|e| CoreError::SessionError(e.to_string()))?;
        *self.current.write().await = user.clone();
        Ok(user)
    }

    pub async fn login(&self, user: SessionUser) -> CoreResult<()> {
        if user.id <= 0 {
            return Err(CoreError::ValidationError(
                "session user must have a positive id".to_string(),
            ));
        }
        self.store
            .save(&user)
            .await
            .map_err(|e| CoreError::SessionError(e.to_string()))?;
        tracing::info!(user_id = user.id, "session user logged in");
        *self.current.write().await = Some(user);
        Ok(())
    }

    pub async fn logout(&self) -> CoreResult<()> {
        self.store
            .clear()
            .await
            .map_err(|e| CoreError::SessionError(e.to_string()))?;
        tracing::info!("session cleared");
        *self.current.write().await = None;
        Ok(())
    }

    /// Snapshot of the logged-in buyer, if any.
    pub async fn current(&self) -> Option<SessionUser> {
        self.current.read().await.clone()
    }
}
