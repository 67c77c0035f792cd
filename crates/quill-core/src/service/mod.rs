//! Application services - the request-independent operations of the app.
//!
//! Handlers stay thin: authorization, provisioning and cascade rules all
//! live here, against the repository ports.

mod accounts;
mod posts;

pub use accounts::AccountService;
pub use posts::PostService;

use crate::error::{DomainError, RepoError};

/// Map storage failures that reach a service into domain errors.
/// `RepoError::NotFound` is handled at call sites where the entity matters.
pub(crate) fn storage_error(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(msg) => DomainError::Duplicate(msg),
        other => DomainError::Internal(other.to_string()),
    }
}
