use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HasId;
use crate::error::DomainError;

/// Upper bound on post titles.
pub const MAX_TITLE_LEN: usize = 100;

/// Post entity - a single authored blog entry.
///
/// A post always references exactly one author. Updates touch title and
/// content only; `date_posted` keeps the original publication time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
}

impl Post {
    /// Create a new post with generated ID and the current time as
    /// publication timestamp. Fails on a missing or oversized title or
    /// missing content.
    pub fn new(
        author_id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let content = content.into();
        validate_title(&title)?;
        validate_content(&content)?;

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            date_posted: Utc::now(),
        })
    }

    /// Replace title and content, keeping id, author and timestamp.
    pub fn revise(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), DomainError> {
        let title = title.into();
        let content = content.into();
        validate_title(&title)?;
        validate_content(&content)?;

        self.title = title;
        self.content = content;
        Ok(())
    }

    /// Stable URL of this post's detail view.
    pub fn detail_path(&self) -> String {
        format!("/api/posts/{}", self.id)
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation("content is required".to_string()));
    }
    Ok(())
}

/// A post renders as its title.
impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl HasId<Uuid> for Post {
    fn id(&self) -> Uuid {
        self.id
    }
}
