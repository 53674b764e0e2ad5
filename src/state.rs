use std::sync::Arc;

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::memory::MemoryStore;
use crate::posts::repo::{PgPostRepo, PostRepo};
use crate::sessions::{MemorySessionStore, SessionStore};
use crate::storage::{DiskStorage, UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub sessions: Arc<dyn SessionStore>,
    pub uploads: Arc<dyn UploadStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (users, posts) = match config.store_backend {
            StoreBackend::Postgres => {
                let pool = db::connect(&config).await?;
                (
                    Arc::new(PgUserRepo::new(pool.clone())) as Arc<dyn UserRepo>,
                    Arc::new(PgPostRepo::new(pool)) as Arc<dyn PostRepo>,
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn UserRepo>,
                    store as Arc<dyn PostRepo>,
                )
            }
        };

        let uploads = Arc::new(DiskStorage::new(config.upload_dir())) as Arc<dyn UploadStore>;
        let sessions = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;

        Ok(Self::from_parts(config, users, posts, sessions, uploads))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        posts: Arc<dyn PostRepo>,
        sessions: Arc<dyn SessionStore>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        Self {
            config,
            users,
            posts,
            sessions,
            uploads,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_uploads().0
    }

    /// In-memory state for tests, plus a handle on the upload store so
    /// tests can see which files exist.
    #[cfg(test)]
    pub fn fake_with_uploads() -> (Self, Arc<crate::storage::MemoryStorage>) {
        use crate::config::SessionConfig;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            store_backend: StoreBackend::Memory,
            database_url: String::new(),
            max_connections: 1,
            public_dir: std::env::temp_dir().join("socialhub-test-public"),
            max_upload_bytes: 1024,
            session: SessionConfig {
                cookie_name: "sid".into(),
                cookie_secure: false,
            },
        });
        let store = Arc::new(MemoryStore::new());
        let uploads = Arc::new(crate::storage::MemoryStorage::default());

        let state = Self::from_parts(
            config,
            store.clone(),
            store,
            Arc::new(MemorySessionStore::new()),
            uploads.clone(),
        );
        (state, uploads)
    }
}
