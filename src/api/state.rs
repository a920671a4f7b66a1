use std::sync::Arc;

use crate::{
    config::{Config, StorageBackend},
    db::{self, CommentStore, MemoryStore, PgStore, UserStore},
    services::{AuthService, CommentService, TokenKeys, UserService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub comments: CommentService,
}

impl AppState {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        comment_store: Arc<dyn CommentStore>,
        tokens: TokenKeys,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            auth: AuthService::new(user_store.clone(), tokens, bcrypt_cost),
            users: UserService::new(user_store),
            comments: CommentService::new(comment_store),
        }
    }

    /// State backed by a fresh in-process store
    pub fn in_memory(jwt_secret: &str, bcrypt_cost: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store,
            TokenKeys::new(jwt_secret, 30),
            bcrypt_cost,
        )
    }

    /// Builds the state for the configured storage backend, migrating Postgres first
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_expiry_days);

        let state = match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Self::new(store.clone(), store, tokens, config.bcrypt_cost)
            }
            StorageBackend::Postgres => {
                let pool = db::create_pool(&config.database_url).await?;
                db::run_migrations(&pool).await?;
                tracing::info!("Connected to PostgreSQL");
                let store = Arc::new(PgStore::new(pool));
                Self::new(store.clone(), store, tokens, config.bcrypt_cost)
            }
        };

        Ok(state)
    }
}
