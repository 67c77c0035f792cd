//! Account lifecycle: registration with profile provisioning, re-saves,
//! and the explicit delete cascade.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Profile, User};
use crate::error::DomainError;
use crate::ports::{PostRepository, ProfileRepository, UserRepository};

use super::storage_error;

/// Maintains the one-to-one correspondence between users and profiles and
/// owns the account delete cascade. Profile creation is composed directly
/// into account creation; there is no event dispatch.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    posts: Arc<dyn PostRepository>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            users,
            profiles,
            posts,
        }
    }

    /// Persist a new user and provision their profile, exactly once, in a
    /// single storage operation. A provisioning failure fails the whole
    /// registration; it is never swallowed.
    pub async fn register(&self, user: User) -> Result<User, DomainError> {
        if self
            .users
            .find_by_username(&user.username)
            .await
            .map_err(storage_error)?
            .is_some()
        {
            return Err(DomainError::Duplicate(format!(
                "username '{}' is already taken",
                user.username
            )));
        }

        let profile = Profile::new(user.id);
        let created = match self.users.create_with_profile(user, profile).await {
            Ok(user) => user,
            Err(crate::error::RepoError::Constraint(msg)) => {
                return Err(DomainError::Duplicate(msg));
            }
            Err(e) => return Err(DomainError::Provisioning(e.to_string())),
        };

        Ok(created)
    }

    /// Re-save an existing user. The profile is re-persisted alongside it;
    /// a missing profile is an invariant violation and surfaces loudly.
    pub async fn update(&self, user: User) -> Result<User, DomainError> {
        let saved = self.users.save(user).await.map_err(storage_error)?;

        let profile = self
            .profiles
            .find_by_user_id(saved.id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| {
                DomainError::Provisioning(format!("user {} has no profile", saved.id))
            })?;
        self.profiles
            .save(profile)
            .await
            .map_err(|e| DomainError::Provisioning(e.to_string()))?;

        Ok(saved)
    }

    /// Delete an account: the user's posts (one bulk statement), their
    /// profile, then the user record itself.
    pub async fn delete(&self, user_id: Uuid) -> Result<(), DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(storage_error)?
            .ok_or(DomainError::NotFound {
                entity_type: "user",
                id: user_id,
            })?;

        self.posts
            .delete_by_author(user.id)
            .await
            .map_err(storage_error)?;
        if let Some(profile) = self
            .profiles
            .find_by_user_id(user.id)
            .await
            .map_err(storage_error)?
        {
            self.profiles
                .delete(profile.id)
                .await
                .map_err(storage_error)?;
        }
        self.users.delete(user.id).await.map_err(storage_error)?;

        Ok(())
    }

    /// A user together with their profile.
    pub async fn find(&self, user_id: Uuid) -> Result<(User, Profile), DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(storage_error)?
            .ok_or(DomainError::NotFound {
                entity_type: "user",
                id: user_id,
            })?;
        let profile = self
            .profiles
            .find_by_user_id(user.id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| {
                DomainError::Provisioning(format!("user {} has no profile", user.id))
            })?;

        Ok((user, profile))
    }

    /// Username lookup, used by the login flow.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.users
            .find_by_username(username)
            .await
            .map_err(storage_error)
    }
}
