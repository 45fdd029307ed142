//! Curator/assignee junction tables and the membership test.
//!
//! Write helpers take a `&mut SqliteConnection` so they run inside the
//! caller's transaction; read helpers take the pool.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use taskflow_core::membership::{plan_reconcile, ReconcilePlan, Team};
use taskflow_core::status::TargetKind;
use taskflow_core::types::DbId;

use crate::models::member::{Member, TeamRow};
use crate::DbPool;

/// One of the four junction tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    ProjectCurators,
    ProjectAssignees,
    TaskCurators,
    TaskAssignees,
}

impl Junction {
    pub fn table(self) -> &'static str {
        match self {
            Junction::ProjectCurators => "project_curators",
            Junction::ProjectAssignees => "project_assignees",
            Junction::TaskCurators => "task_curators",
            Junction::TaskAssignees => "task_assignees",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            Junction::ProjectCurators | Junction::ProjectAssignees => "project_id",
            Junction::TaskCurators | Junction::TaskAssignees => "task_id",
        }
    }

    pub fn curators(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Project => Junction::ProjectCurators,
            TargetKind::Task => Junction::TaskCurators,
        }
    }

    pub fn assignees(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Project => Junction::ProjectAssignees,
            TargetKind::Task => Junction::TaskAssignees,
        }
    }
}

/// Membership queries shared by projects and tasks.
pub struct TeamRepo;

impl TeamRepo {
    /// True iff `user_id` is a curator or an assignee of the target.
    pub async fn is_participant(
        pool: &DbPool,
        kind: TargetKind,
        target_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let curators = Junction::curators(kind);
        let assignees = Junction::assignees(kind);
        let query = format!(
            "SELECT EXISTS (
                SELECT 1 FROM {ct} WHERE {cp} = ? AND user_id = ?
                UNION ALL
                SELECT 1 FROM {at} WHERE {ap} = ? AND user_id = ?
             )",
            ct = curators.table(),
            cp = curators.parent_column(),
            at = assignees.table(),
            ap = assignees.parent_column(),
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(target_id)
            .bind(user_id)
            .bind(target_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// How many of `user_ids` (already distinct) belong to `department_id`.
    pub async fn count_in_department(
        pool: &DbPool,
        user_ids: &[DbId],
        department_id: DbId,
    ) -> Result<usize, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE department_id = ");
        qb.push_bind(department_id);
        qb.push(" AND id IN (");
        let mut ids = qb.separated(", ");
        for id in user_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
        Ok(count as usize)
    }

    /// Members of every parent in `parent_ids`, grouped by parent.
    pub async fn members_of(
        pool: &DbPool,
        junction: Junction,
        parent_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<Member>>, sqlx::Error> {
        let mut grouped: HashMap<DbId, Vec<Member>> = HashMap::new();
        if parent_ids.is_empty() {
            return Ok(grouped);
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT j.{parent} AS parent_id, u.id, u.full_name, u.position, u.department_id
             FROM {table} j JOIN users u ON u.id = j.user_id
             WHERE j.{parent} IN (",
            parent = junction.parent_column(),
            table = junction.table(),
        ));
        let mut ids = qb.separated(", ");
        for id in parent_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY u.id");

        let rows: Vec<TeamRow> = qb.build_query_as().fetch_all(pool).await?;
        for row in rows {
            grouped.entry(row.parent_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Current user ids of one junction set, ascending.
    pub async fn member_ids(
        pool: &DbPool,
        junction: Junction,
        parent_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        member_ids(&mut conn, junction, parent_id).await
    }
}

pub(crate) async fn member_ids(
    conn: &mut SqliteConnection,
    junction: Junction,
    parent_id: DbId,
) -> Result<Vec<DbId>, sqlx::Error> {
    let query = format!(
        "SELECT user_id FROM {} WHERE {} = ? ORDER BY user_id",
        junction.table(),
        junction.parent_column()
    );
    sqlx::query_scalar::<_, DbId>(&query)
        .bind(parent_id)
        .fetch_all(conn)
        .await
}

/// Insert pairs, silently skipping ones that already exist.
pub(crate) async fn insert_members(
    conn: &mut SqliteConnection,
    junction: Junction,
    parent_id: DbId,
    user_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    let query = format!(
        "INSERT OR IGNORE INTO {} ({}, user_id) VALUES (?, ?)",
        junction.table(),
        junction.parent_column()
    );
    for user_id in user_ids {
        sqlx::query(&query)
            .bind(parent_id)
            .bind(*user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn remove_members(
    conn: &mut SqliteConnection,
    junction: Junction,
    parent_id: DbId,
    user_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    let query = format!(
        "DELETE FROM {} WHERE {} = ? AND user_id = ?",
        junction.table(),
        junction.parent_column()
    );
    for user_id in user_ids {
        sqlx::query(&query)
            .bind(parent_id)
            .bind(*user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Turn one junction set into `desired` by set difference.
pub(crate) async fn reconcile(
    conn: &mut SqliteConnection,
    junction: Junction,
    parent_id: DbId,
    desired: &[DbId],
) -> Result<ReconcilePlan, sqlx::Error> {
    let current = member_ids(&mut *conn, junction, parent_id).await?;
    let plan = plan_reconcile(&current, desired);
    remove_members(&mut *conn, junction, parent_id, &plan.remove).await?;
    insert_members(&mut *conn, junction, parent_id, &plan.add).await?;
    Ok(plan)
}

/// Write both sets of a freshly inserted parent.
pub(crate) async fn insert_team(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    parent_id: DbId,
    team: &Team,
) -> Result<(), sqlx::Error> {
    insert_members(&mut *conn, Junction::curators(kind), parent_id, team.curators()).await?;
    insert_members(&mut *conn, Junction::assignees(kind), parent_id, team.assignees()).await
}

/// Reconcile both sets of an existing parent.
pub(crate) async fn reconcile_team(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    parent_id: DbId,
    team: &Team,
) -> Result<(), sqlx::Error> {
    let curators = reconcile(&mut *conn, Junction::curators(kind), parent_id, team.curators()).await?;
    let assignees =
        reconcile(&mut *conn, Junction::assignees(kind), parent_id, team.assignees()).await?;
    if !curators.is_noop() || !assignees.is_noop() {
        tracing::debug!(
            target_kind = kind.as_str(),
            parent_id,
            curators_added = curators.add.len(),
            curators_removed = curators.remove.len(),
            assignees_added = assignees.add.len(),
            assignees_removed = assignees.remove.len(),
            "Reconciled team"
        );
    }
    Ok(())
}
