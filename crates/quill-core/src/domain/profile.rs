use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HasId;

/// Profile entity - the one-to-one companion record of a [`super::User`].
///
/// Created exactly once, in the same operation that persists a new user,
/// and re-saved whenever the user is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
}

impl Profile {
    /// Create a profile bound to a user.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
        }
    }
}

impl HasId<Uuid> for Profile {
    fn id(&self) -> Uuid {
        self.id
    }
}
