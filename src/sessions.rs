use std::collections::HashMap;

use axum::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// State held for a logged-in client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SessionData>>;
    async fn set(&self, id: Uuid, data: SessionData) -> anyhow::Result<()>;
    async fn destroy(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Process-local sessions. Lost on restart and not shared between instances.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<Uuid, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SessionData>> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn set(&self, id: Uuid, data: SessionData) -> anyhow::Result<()> {
        debug!(session_id = %id, user = %data.user, "session set");
        self.inner.write().await.insert(id, data);
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> anyhow::Result<()> {
        let removed = self.inner.write().await.remove(&id);
        debug!(session_id = %id, existed = removed.is_some(), "session destroyed");
        Ok(())
    }
}
