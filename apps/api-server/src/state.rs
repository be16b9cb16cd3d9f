//! Application state - shared across all handlers.

use std::sync::Arc;

use murmur_core::ports::{
    Cache, CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use murmur_infra::memory::{
    MemoryCommentRepository, MemoryFollowRepository, MemoryGroupRepository, MemoryPostRepository,
    MemoryStore, MemoryUserRepository,
};
use murmur_infra::database::{
    DatabaseConfig, PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository, connect,
};
use murmur_infra::InMemoryCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let state = match db_config {
            Some(config) => match connect(config).await {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    Self {
                        users: Arc::new(PostgresUserRepository::new(conn.clone())),
                        groups: Arc::new(PostgresGroupRepository::new(conn.clone())),
                        posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                        comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
                        follows: Arc::new(PostgresFollowRepository::new(conn)),
                        cache: Arc::new(InMemoryCache::new()),
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Self::in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory()
            }
        };

        tracing::info!("Application state initialized");

        state
    }

    /// State backed entirely by the in-memory store.
    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(MemoryUserRepository::new(store.clone())),
            groups: Arc::new(MemoryGroupRepository::new(store.clone())),
            posts: Arc::new(MemoryPostRepository::new(store.clone())),
            comments: Arc::new(MemoryCommentRepository::new(store.clone())),
            follows: Arc::new(MemoryFollowRepository::new(store)),
            cache: Arc::new(InMemoryCache::new()),
        }
    }
}
