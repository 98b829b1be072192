//! User directory: role lookup for requesters and profile expansion for
//! task assignees.
//!
//! The directory is seeded once from configuration and is read-only
//! afterwards, so it is shared without locking.

use std::collections::HashMap;

use taskdeck_proto::task::UserId;
use taskdeck_proto::user::{Role, UserSummary};

/// A user as declared in the `[[users]]` tables of the config file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UserRecord {
    /// User identifier, as forwarded by the authentication layer.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Role, `member` when omitted.
    #[serde(default)]
    pub role: Role,
    /// Avatar reference.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl UserRecord {
    fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Caller's user id.
    pub id: UserId,
    /// Caller's role, taken from the directory.
    pub role: Role,
}

impl Requester {
    /// Creates a requester.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Read-only directory of known users.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<UserId, UserRecord>,
}

impl UserDirectory {
    /// Builds a directory from user records. Later duplicates win.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { users }
    }

    /// Number of known users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no user is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Returns `true` if `id` names a known user.
    #[must_use]
    pub fn contains(&self, id: &UserId) -> bool {
        self.users.contains_key(id)
    }

    /// Resolves a user id into a requester with its directory role.
    #[must_use]
    pub fn requester(&self, id: &UserId) -> Option<Requester> {
        self.users
            .get(id)
            .map(|record| Requester::new(record.id.clone(), record.role))
    }

    /// Expands user ids into public summaries, in order.
    ///
    /// Ids without a directory entry are skipped.
    #[must_use]
    pub fn summaries(&self, ids: &[UserId]) -> Vec<UserSummary> {
        ids.iter()
            .filter_map(|id| self.users.get(id))
            .map(UserRecord::summary)
            .collect()
    }
}
