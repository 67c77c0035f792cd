//! Post CRUD with the uniform authorship rule: only the author mutates.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Post;
use crate::error::{DomainError, RepoError};
use crate::ports::PostRepository;

use super::storage_error;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// All posts, most recent first. Publicly readable.
    pub async fn list(&self) -> Result<Vec<Post>, DomainError> {
        self.posts.list_recent().await.map_err(storage_error)
    }

    /// One post by id. Publicly readable.
    pub async fn get(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or(DomainError::NotFound {
                entity_type: "post",
                id,
            })
    }

    /// Create a post authored by the caller.
    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, DomainError> {
        let post = Post::new(author_id, title, content)?;
        self.posts.save(post).await.map_err(storage_error)
    }

    /// Update title and content of a post the caller authored.
    /// Authorization runs before validation and before any write.
    pub async fn update(
        &self,
        caller_id: Uuid,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, DomainError> {
        let mut post = self.get(id).await?;
        if post.author_id != caller_id {
            return Err(DomainError::PermissionDenied);
        }

        post.revise(title, content)?;
        self.posts.save(post).await.map_err(storage_error)
    }

    /// Delete a post the caller authored.
    pub async fn delete(&self, caller_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let post = self.get(id).await?;
        if post.author_id != caller_id {
            return Err(DomainError::PermissionDenied);
        }

        match self.posts.delete(post.id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(DomainError::NotFound {
                entity_type: "post",
                id,
            }),
            Err(e) => Err(storage_error(e)),
        }
    }
}
