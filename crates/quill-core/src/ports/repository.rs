use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, Profile, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update). Atomic single-row write.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` when absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with account-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Persist a brand-new user together with their profile in a single
    /// storage operation. This is the only path that creates profiles.
    async fn create_with_profile(&self, user: User, profile: Profile) -> Result<User, RepoError>;
}

/// Profile repository.
#[async_trait]
pub trait ProfileRepository: BaseRepository<Profile, Uuid> {
    /// Find the profile belonging to a user.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, most recently posted first.
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError>;

    /// All posts authored by a user.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Delete every post authored by a user in one statement.
    /// Returns the number of deleted posts.
    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}
