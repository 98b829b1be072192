//! User roles and the public user summary embedded in task views.

use serde::{Deserialize, Serialize};

use crate::task::UserId;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees and mutates every task.
    Admin,
    /// Sees and progresses the tasks assigned to them.
    #[default]
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// Public profile of an assignee, as expanded into task views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User identifier.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Avatar reference, if the user has one.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}
