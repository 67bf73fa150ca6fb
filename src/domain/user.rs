use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Badge number of the built-in administrator, which can never be deleted.
pub const DEFAULT_ADMIN_ID_NUMBER: &str = "ADMIN001";

/// Staff role. Permissions per role live in the policy table, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "admin")]
    Admin,
    #[serde(alias = "manager")]
    Manager,
    #[serde(alias = "staff")]
    Staff,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Staff => "Staff",
        };
        f.write_str(name)
    }
}

/// The already-authenticated caller. The ledger trusts it as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Represents a member of staff in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub id_number: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }
}

/// Payload for creating a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCreate {
    pub id_number: String,
    pub full_name: String,
    pub role: Role,
}

impl UserCreate {
    pub fn new(id_number: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id_number: id_number.into(),
            full_name: full_name.into(),
            role,
        }
    }
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub role: Option<Role>,
}
