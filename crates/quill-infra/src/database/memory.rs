//! In-memory repositories - used as fallback when no database is configured,
//! and as the storage backend for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, Profile, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, ProfileRepository, UserRepository};

/// Shared backing store for the in-memory repositories.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
    posts: RwLock<HashMap<Uuid, Post>>,
}

/// In-memory user repository.
pub struct MemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl MemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.users.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        self.store
            .users
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.users.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .store
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_with_profile(&self, user: User, profile: Profile) -> Result<User, RepoError> {
        // Both writes under both locks, mirroring the transactional insert.
        let mut users = self.store.users.write().await;
        let mut profiles = self.store.profiles.write().await;

        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepoError::Constraint("entity already exists".to_string()));
        }

        users.insert(user.id, user.clone());
        profiles.insert(profile.id, profile);
        Ok(user)
    }
}

/// In-memory profile repository.
pub struct MemoryProfileRepository {
    store: Arc<MemoryStore>,
}

impl MemoryProfileRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for MemoryProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self.store.profiles.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Profile) -> Result<Profile, RepoError> {
        self.store
            .profiles
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.profiles.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self
            .store
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}

/// In-memory post repository.
pub struct MemoryPostRepository {
    store: Arc<MemoryStore>,
}

impl MemoryPostRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        self.store
            .posts
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.posts.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self.store.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.date_posted.cmp(&a.date_posted));
        Ok(posts)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .store
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let mut posts = self.store.posts.write().await;
        let before = posts.len();
        posts.retain(|_, p| p.author_id != author_id);
        Ok((before - posts.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use quill_core::DomainError;
    use quill_core::domain::User;
    use quill_core::service::{AccountService, PostService};

    use super::*;

    fn harness() -> (Arc<MemoryStore>, AccountService, PostService) {
        let store = Arc::new(MemoryStore::default());
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new(store.clone()));
        let profiles: Arc<dyn ProfileRepository> =
            Arc::new(MemoryProfileRepository::new(store.clone()));
        let posts: Arc<dyn PostRepository> = Arc::new(MemoryPostRepository::new(store.clone()));

        let accounts = AccountService::new(users, profiles, posts.clone());
        let post_service = PostService::new(posts);
        (store, accounts, post_service)
    }

    fn test_user(username: &str) -> User {
        User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "12345".to_string(),
        )
    }

    #[tokio::test]
    async fn register_provisions_profile_exactly_once() {
        let (store, accounts, _) = harness();

        let user = accounts.register(test_user("testuser")).await.unwrap();

        let profiles = store.profiles.read().await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles.values().next().unwrap().user_id, user.id);
    }

    #[tokio::test]
    async fn resaving_user_does_not_create_second_profile() {
        let (store, accounts, _) = harness();

        let mut user = accounts.register(test_user("testuser")).await.unwrap();
        user.email = "new@example.com".to_string();
        accounts.update(user).await.unwrap();

        assert_eq!(store.profiles.read().await.len(), 1);
    }

    #[tokio::test]
    async fn resaving_user_without_profile_fails_loudly() {
        let (store, accounts, _) = harness();

        // A user row that never went through registration.
        let user = test_user("orphan");
        store.users.write().await.insert(user.id, user.clone());

        let result = accounts.update(user).await;

        assert!(matches!(result, Err(DomainError::Provisioning(_))));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let (store, accounts, _) = harness();

        accounts.register(test_user("testuser")).await.unwrap();
        let result = accounts.register(test_user("testuser")).await;

        assert!(matches!(result, Err(DomainError::Duplicate(_))));
        assert_eq!(store.users.read().await.len(), 1);
        assert_eq!(store.profiles.read().await.len(), 1);
    }

    #[tokio::test]
    async fn create_then_read_roundtrip() {
        let (_, accounts, posts) = harness();
        let author = accounts.register(test_user("testuser")).await.unwrap();

        let created = posts
            .create(author.id, "Test Post", "This is a test post")
            .await
            .unwrap();
        let fetched = posts.get(created.id).await.unwrap();

        assert_eq!(fetched.title, "Test Post");
        assert_eq!(fetched.content, "This is a test post");
        assert_eq!(fetched.author_id, author.id);
        assert!(fetched.date_posted <= Utc::now());
        assert_eq!(fetched.to_string(), "Test Post");
    }

    #[tokio::test]
    async fn list_is_most_recent_first() {
        let (store, accounts, posts) = harness();
        let author = accounts.register(test_user("testuser")).await.unwrap();

        let mut old = posts.create(author.id, "old", "body").await.unwrap();
        old.date_posted = Utc::now() - TimeDelta::hours(2);
        store.posts.write().await.insert(old.id, old.clone());
        let fresh = posts.create(author.id, "fresh", "body").await.unwrap();

        let listed = posts.list().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, fresh.id);
        assert_eq!(listed[1].id, old.id);
    }

    #[tokio::test]
    async fn non_author_update_is_rejected_without_mutation() {
        let (_, accounts, posts) = harness();
        let author = accounts.register(test_user("author")).await.unwrap();
        let intruder = accounts.register(test_user("intruder")).await.unwrap();

        let post = posts
            .create(author.id, "Test Post", "This is a test post")
            .await
            .unwrap();
        let result = posts
            .update(intruder.id, post.id, "hijacked", "hijacked")
            .await;

        assert!(matches!(result, Err(DomainError::PermissionDenied)));
        let unchanged = posts.get(post.id).await.unwrap();
        assert_eq!(unchanged.title, "Test Post");
        assert_eq!(unchanged.content, "This is a test post");
    }

    #[tokio::test]
    async fn non_author_delete_is_rejected_without_mutation() {
        let (_, accounts, posts) = harness();
        let author = accounts.register(test_user("author")).await.unwrap();
        let intruder = accounts.register(test_user("intruder")).await.unwrap();

        let post = posts.create(author.id, "Test Post", "body").await.unwrap();
        let result = posts.delete(intruder.id, post.id).await;

        assert!(matches!(result, Err(DomainError::PermissionDenied)));
        assert!(posts.get(post.id).await.is_ok());
    }

    #[tokio::test]
    async fn author_can_update_and_delete_own_post() {
        let (_, accounts, posts) = harness();
        let author = accounts.register(test_user("testuser")).await.unwrap();

        let post = posts
            .create(author.id, "New title", "New Content")
            .await
            .unwrap();
        let updated = posts
            .update(author.id, post.id, "New title - updated", "New Content - updated")
            .await
            .unwrap();
        assert_eq!(updated.title, "New title - updated");
        assert_eq!(updated.date_posted, post.date_posted);

        posts.delete(author.id, post.id).await.unwrap();
        assert!(matches!(
            posts.get(post.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn deleting_account_removes_their_posts() {
        let (store, accounts, posts) = harness();
        let doomed = accounts.register(test_user("doomed")).await.unwrap();
        let bystander = accounts.register(test_user("bystander")).await.unwrap();

        posts.create(doomed.id, "one", "body").await.unwrap();
        posts.create(doomed.id, "two", "body").await.unwrap();
        let kept = posts.create(bystander.id, "three", "body").await.unwrap();

        accounts.delete(doomed.id).await.unwrap();

        let remaining = posts.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
        assert!(store.users.read().await.get(&doomed.id).is_none());
        assert_eq!(store.profiles.read().await.len(), 1);
    }
}
