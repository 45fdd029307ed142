//! Authorization engine.
//!
//! Decisions are pure functions of the [`Actor`] and of facts the store
//! reads for the current request (target department, membership, team
//! department counts). Nothing here touches the database, so every decision
//! reflects whatever state the caller read just before asking.
//!
//! Precedence:
//! 1. Super roles (Owner, Admin, Deputy Admin) are allowed everything.
//! 2. Project Managers are confined to their own department and may not
//!    touch or grant leadership roles.
//! 3. Members and Guests only see and close what they curate or execute.
//!
//! The team/department invariant (every curator and assignee belongs to the
//! entity's department) is checked for every role, super roles included.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::TargetKind;
use crate::types::DbId;

pub const REASON_TEAM_OUTSIDE_DEPARTMENT: &str = "team members outside department";

/// The user on whose behalf a request is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
    pub department_id: DbId,
}

impl Actor {
    pub fn new(id: DbId, role: Role, department_id: DbId) -> Self {
        Self {
            id,
            role,
            department_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert a deny into [`CoreError::Forbidden`] carrying the reason.
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(CoreError::Forbidden(reason)),
        }
    }
}

/// Collections an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Users,
    Departments,
    Projects,
    Tasks,
    Reports,
}

/// Row filter the store applies to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Rows whose (inherited) department id equals the value.
    Department(DbId),
    /// Rows where the user is a curator or an assignee.
    Participant(DbId),
}

/// Facts for creating or editing a project or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamFacts {
    /// Department the entity will belong to after the write.
    pub declared_department: DbId,
    /// Department the entity belongs to now; `None` on create.
    pub existing_department: Option<DbId>,
    /// Size of the deduplicated curator + assignee id set.
    pub distinct_members: usize,
    /// How many of those ids belong to users of `declared_department`.
    pub members_in_department: usize,
}

/// Facts about an existing project or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFacts {
    pub kind: TargetKind,
    pub department_id: DbId,
    /// Whether the actor is a curator or assignee of the target.
    pub is_participant: bool,
}

/// Facts about a user being managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFacts {
    pub department_id: DbId,
    pub role: Role,
}

/// Role and department an account will hold after a user-management write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: Role,
    pub department_id: DbId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFacts {
    Department(DbId),
    /// Task chat; carries the department inherited from the task's project.
    Task { department_id: DbId },
}

/// An operation descriptor paired with the facts needed to decide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create or edit a project or task together with its team.
    WriteTeamed(TeamFacts),
    Close(TargetFacts),
    FileReport(TargetFacts),
    Delete(TargetFacts),
    CreateUser(RoleGrant),
    EditUser { target: UserFacts, grant: RoleGrant },
    ChangeRole { target: UserFacts, role: Role },
    DeleteUser(UserFacts),
    Chat(ChatFacts),
}

/// Decide whether `actor` may perform `op`.
pub fn authorize(actor: &Actor, op: &Operation) -> Decision {
    match op {
        Operation::WriteTeamed(facts) => authorize_team_write(actor, facts),
        Operation::Close(target) => authorize_close(actor, target),
        Operation::FileReport(target) => authorize_report(actor, target),
        Operation::Delete(target) => authorize_delete(actor, target),
        Operation::CreateUser(grant) => authorize_user_create(actor, grant),
        Operation::EditUser { target, grant } => authorize_user_edit(actor, target, Some(grant)),
        Operation::ChangeRole { target, role } => {
            let grant = RoleGrant {
                role: *role,
                department_id: target.department_id,
            };
            authorize_user_edit(actor, target, Some(&grant))
        }
        Operation::DeleteUser(target) => authorize_user_edit(actor, target, None),
        Operation::Chat(facts) => authorize_chat(actor, facts),
    }
}

/// Resolve the row filter for a listing.
///
/// Super actors see everything, optionally narrowed to `requested_department`.
/// Project Managers always see their own department. Participants see what
/// they are on; they may not list users at all.
pub fn list_scope(
    actor: &Actor,
    listing: Listing,
    requested_department: Option<DbId>,
) -> Result<ListScope, CoreError> {
    if actor.role.is_super() {
        return Ok(requested_department.map_or(ListScope::All, ListScope::Department));
    }
    if actor.role == Role::ProjectManager {
        return Ok(ListScope::Department(actor.department_id));
    }
    match listing {
        Listing::Users => Err(CoreError::forbidden("insufficient permissions to list users")),
        Listing::Departments => Ok(ListScope::Department(actor.department_id)),
        Listing::Projects | Listing::Tasks | Listing::Reports => {
            Ok(ListScope::Participant(actor.id))
        }
    }
}

fn authorize_team_write(actor: &Actor, facts: &TeamFacts) -> Decision {
    if actor.role.is_participant_only() {
        return Decision::deny("insufficient permissions to create or edit projects and tasks");
    }
    if actor.role == Role::ProjectManager {
        if facts.declared_department != actor.department_id {
            return Decision::deny("project managers may only work within their own department");
        }
        if let Some(existing) = facts.existing_department {
            if existing != actor.department_id {
                return Decision::deny(
                    "project managers may only edit items of their own department",
                );
            }
        }
    }
    if facts.members_in_department != facts.distinct_members {
        return Decision::deny(REASON_TEAM_OUTSIDE_DEPARTMENT);
    }
    Decision::Allow
}

fn authorize_close(actor: &Actor, target: &TargetFacts) -> Decision {
    scoped_target_action(actor, target, "close")
}

fn authorize_report(actor: &Actor, target: &TargetFacts) -> Decision {
    scoped_target_action(actor, target, "file a report against")
}

/// Shared rule for closing and reporting: managers within their department,
/// participants on what they curate or execute.
fn scoped_target_action(actor: &Actor, target: &TargetFacts, verb: &str) -> Decision {
    if actor.role.is_super() {
        return Decision::Allow;
    }
    if actor.role == Role::ProjectManager {
        return if target.department_id == actor.department_id {
            Decision::Allow
        } else {
            Decision::deny(format!(
                "project managers may only {verb} a {} of their own department",
                target.kind.as_str()
            ))
        };
    }
    if target.is_participant {
        Decision::Allow
    } else {
        Decision::deny(format!(
            "only a curator or assignee may {verb} this {}",
            target.kind.as_str()
        ))
    }
}

fn authorize_delete(actor: &Actor, target: &TargetFacts) -> Decision {
    if actor.role.is_super() {
        return Decision::Allow;
    }
    if actor.role == Role::ProjectManager && target.department_id == actor.department_id {
        return Decision::Allow;
    }
    Decision::deny(format!(
        "insufficient permissions to delete this {}",
        target.kind.as_str()
    ))
}

fn authorize_user_create(actor: &Actor, grant: &RoleGrant) -> Decision {
    if actor.role.is_super() {
        return Decision::Allow;
    }
    if !actor.role.can_manage_users() {
        return Decision::deny("insufficient permissions to manage users");
    }
    manager_grant_check(actor, grant)
}

/// Edits, role changes and deletes of an existing account. `grant` is the
/// role/department the account ends up with; `None` for deletes.
fn authorize_user_edit(actor: &Actor, target: &UserFacts, grant: Option<&RoleGrant>) -> Decision {
    if actor.role.is_super() {
        return Decision::Allow;
    }
    if !actor.role.can_manage_users() {
        return Decision::deny("insufficient permissions to manage users");
    }
    if target.department_id != actor.department_id {
        return Decision::deny("project managers may only manage users of their own department");
    }
    if target.role.is_leadership() {
        return Decision::deny("leadership accounts cannot be changed by a project manager");
    }
    match grant {
        Some(grant) => manager_grant_check(actor, grant),
        None => Decision::Allow,
    }
}

fn manager_grant_check(actor: &Actor, grant: &RoleGrant) -> Decision {
    if grant.department_id != actor.department_id {
        return Decision::deny("project managers may only assign their own department");
    }
    if grant.role.is_leadership() {
        return Decision::deny("project managers may only assign the Member or Guest role");
    }
    Decision::Allow
}

fn authorize_chat(actor: &Actor, facts: &ChatFacts) -> Decision {
    if actor.role.is_super() {
        return Decision::Allow;
    }
    match facts {
        ChatFacts::Department(department_id) if *department_id == actor.department_id => {
            Decision::Allow
        }
        ChatFacts::Department(_) => Decision::deny("access is limited to your department's chat"),
        ChatFacts::Task { department_id } if *department_id == actor.department_id => {
            Decision::Allow
        }
        ChatFacts::Task { .. } => Decision::deny("access is limited to tasks of your department"),
    }
}
