//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PostRepository, ProfileRepository, UserRepository};
use quill_core::service::{AccountService, PostService};
use quill_infra::database::DatabaseConfig;
use quill_infra::{MemoryPostRepository, MemoryProfileRepository, MemoryStore, MemoryUserRepository};

#[cfg(feature = "postgres")]
use quill_infra::database::{
    DatabaseConnections, PostgresPostRepository, PostgresProfileRepository, PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
}

impl AppState {
    /// Build the application state with appropriate repository implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        #[cfg(feature = "postgres")]
        {
            if let Some(config) = db_config {
                match DatabaseConnections::init(config).await {
                    Ok(db) => {
                        let users: Arc<dyn UserRepository> =
                            Arc::new(PostgresUserRepository::new(db.main.clone()));
                        let profiles: Arc<dyn ProfileRepository> =
                            Arc::new(PostgresProfileRepository::new(db.main.clone()));
                        let posts: Arc<dyn PostRepository> =
                            Arc::new(PostgresPostRepository::new(db.main.clone()));

                        tracing::info!("Application state initialized (postgres)");
                        return Self::from_repos(users, profiles, posts);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            let _ = db_config;
            tracing::info!("Built without postgres support - using in-memory repositories");
        }

        Self::in_memory()
    }

    /// State backed entirely by in-memory repositories.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self::from_repos(
            Arc::new(MemoryUserRepository::new(store.clone())),
            Arc::new(MemoryProfileRepository::new(store.clone())),
            Arc::new(MemoryPostRepository::new(store)),
        )
    }

    fn from_repos(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(users, profiles, posts.clone())),
            posts: Arc::new(PostService::new(posts)),
        }
    }
}
