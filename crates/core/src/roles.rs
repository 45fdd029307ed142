//! Role model.
//!
//! Roles form a total privilege order, highest first:
//! Owner, Admin, Deputy Admin, Project Manager, Member, Guest.
//! Role strings are parsed once at the boundary (case-insensitive) and the
//! rest of the crate works with [`Role`] only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_OWNER: &str = "Owner";
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_DEPUTY_ADMIN: &str = "Deputy Admin";
pub const ROLE_PROJECT_MANAGER: &str = "Project Manager";
pub const ROLE_MEMBER: &str = "Member";
pub const ROLE_GUEST: &str = "Guest";

/// All accepted role strings, in privilege order.
pub const VALID_ROLES: &[&str] = &[
    ROLE_OWNER,
    ROLE_ADMIN,
    ROLE_DEPUTY_ADMIN,
    ROLE_PROJECT_MANAGER,
    ROLE_MEMBER,
    ROLE_GUEST,
];

/// A user's role. Variants are declared in privilege order so that
/// `Owner < Guest` under the derived `Ord` (lower means more privileged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Owner,
    Admin,
    DeputyAdmin,
    ProjectManager,
    Member,
    Guest,
}

impl Role {
    /// Parse a role string, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "deputy admin" => Ok(Role::DeputyAdmin),
            "project manager" => Ok(Role::ProjectManager),
            "member" => Ok(Role::Member),
            "guest" => Ok(Role::Guest),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{}'. Must be one of: {}",
                raw.trim(),
                VALID_ROLES.join(", ")
            ))),
        }
    }

    /// Canonical string stored in the `users.role` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => ROLE_OWNER,
            Role::Admin => ROLE_ADMIN,
            Role::DeputyAdmin => ROLE_DEPUTY_ADMIN,
            Role::ProjectManager => ROLE_PROJECT_MANAGER,
            Role::Member => ROLE_MEMBER,
            Role::Guest => ROLE_GUEST,
        }
    }

    /// Owner, Admin and Deputy Admin: unrestricted across departments.
    pub fn is_super(self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::DeputyAdmin)
    }

    /// Super roles plus Project Manager. A non-super actor may neither touch
    /// nor grant these.
    pub fn is_leadership(self) -> bool {
        self.is_super() || self == Role::ProjectManager
    }

    pub fn can_manage_users(self) -> bool {
        self.is_leadership()
    }

    /// Member and Guest: access is limited to what they participate in.
    pub fn is_participant_only(self) -> bool {
        matches!(self, Role::Member | Role::Guest)
    }
}

pub fn is_super_role(role: Role) -> bool {
    role.is_super()
}

pub fn is_leadership_role(role: Role) -> bool {
    role.is_leadership()
}

pub fn can_manage_users(role: Role) -> bool {
    role.can_manage_users()
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}
