//! HTTP handlers. Each one resolves the actor, gathers the facts the
//! authorization engine needs, asks for a decision and only then calls the
//! store.

pub mod auth;
pub mod chat;
pub mod departments;
pub mod profile;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod upload;
pub mod users;

use serde::Deserialize;
use taskflow_core::authz::{authorize, Actor, Decision, Operation, TargetFacts, TeamFacts};
use taskflow_core::error::CoreError;
use taskflow_core::membership::Team;
use taskflow_core::status::TargetKind;
use taskflow_core::types::DbId;
use taskflow_db::repositories::{ProjectRepo, TaskRepo, TeamRepo};
use taskflow_db::DbPool;

use crate::error::AppResult;

/// Optional department narrowing honoured for super roles.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub department_id: Option<DbId>,
}

/// Ask the engine and turn a deny into a 403.
pub(crate) fn enforce(actor: &Actor, op: Operation) -> AppResult<()> {
    match authorize(actor, &op) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::warn!(
                actor_id = actor.id,
                role = %actor.role,
                operation = ?op,
                reason = %reason,
                "Operation denied"
            );
            Err(CoreError::Forbidden(reason).into())
        }
    }
}

/// Team facts for writing `team` into `declared_department`.
pub(crate) async fn team_facts(
    pool: &DbPool,
    team: &Team,
    declared_department: DbId,
    existing_department: Option<DbId>,
) -> AppResult<TeamFacts> {
    let members = team.all_members();
    let members_in_department =
        TeamRepo::count_in_department(pool, &members, declared_department).await?;
    Ok(TeamFacts {
        declared_department,
        existing_department,
        distinct_members: members.len(),
        members_in_department,
    })
}

/// Department and membership facts of an existing project or task.
pub(crate) async fn target_facts(
    pool: &DbPool,
    actor: &Actor,
    kind: TargetKind,
    id: DbId,
) -> AppResult<TargetFacts> {
    let department_id = match kind {
        TargetKind::Project => ProjectRepo::scope(pool, id)
            .await?
            .map(|s| s.department_id),
        TargetKind::Task => TaskRepo::scope(pool, id).await?.map(|s| s.department_id),
    }
    .ok_or(CoreError::NotFound {
        entity: kind.entity_name(),
        id,
    })?;

    let is_participant = TeamRepo::is_participant(pool, kind, id, actor.id).await?;
    Ok(TargetFacts {
        kind,
        department_id,
        is_participant,
    })
}
