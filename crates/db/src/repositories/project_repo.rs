//! Repository for the `projects` table and its junction sets.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use taskflow_core::authz::ListScope;
use taskflow_core::status::{ProjectStatus, TargetKind, TASK_STATUS_DONE};
use taskflow_core::types::DbId;

use crate::error::{conflict_on_unique, DbError};
use crate::models::project::{Project, ProjectInput, ProjectScope, ProjectWithTeam};
use crate::repositories::alloc::allocate_target_id;
use crate::repositories::team_repo::{self, Junction, TeamRepo};
use crate::{begin_write, DbPool};

const SELECT_PROJECTS: &str = "SELECT p.id, p.key, p.name, p.status, p.department_id,
        COALESCE(d.name, '') AS department_name,
        p.curator_user_id,
        COALESCE(u.full_name, '') AS curator_name,
        p.created_at
     FROM projects p
     LEFT JOIN departments d ON d.id = p.department_id
     LEFT JOIN users u ON u.id = p.curator_user_id";

/// Provides the transactional write paths and scoped listings for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project and its team in one transaction.
    ///
    /// The id is the lowest unused one; a blank key becomes `PRJ-{id}`.
    pub async fn create(pool: &DbPool, input: &ProjectInput) -> Result<ProjectWithTeam, DbError> {
        let team = input.validate()?;
        let mut tx = begin_write(pool).await?;

        let id = allocate_target_id(&mut tx, TargetKind::Project).await?;
        let key = match input.key.trim() {
            "" => format!("PRJ-{id}"),
            given => given.to_string(),
        };

        sqlx::query(
            "INSERT INTO projects (id, key, name, status, department_id, curator_user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&key)
        .bind(input.name.trim())
        .bind(ProjectStatus::Active.as_str())
        .bind(input.department_id)
        .bind(team.primary_curator())
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Project key '{key}' already exists")))?;

        team_repo::insert_team(&mut tx, TargetKind::Project, id, &team).await?;
        tx.commit().await?;

        tracing::info!(project_id = id, key = %key, department_id = input.department_id, "Project created");
        Self::require(pool, id).await
    }

    /// Replace a project's scalar fields and reconcile both team sets.
    pub async fn update(
        pool: &DbPool,
        id: DbId,
        input: &ProjectInput,
    ) -> Result<ProjectWithTeam, DbError> {
        let team = input.validate()?;
        let key = input.key.trim();
        let mut tx = begin_write(pool).await?;

        let result = sqlx::query(
            "UPDATE projects SET
                key = COALESCE(NULLIF(?, ''), key),
                name = ?,
                department_id = ?,
                curator_user_id = ?
             WHERE id = ?",
        )
        .bind(key)
        .bind(input.name.trim())
        .bind(input.department_id)
        .bind(team.primary_curator())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Project key '{key}' already exists")))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Project", id));
        }

        team_repo::reconcile_team(&mut tx, TargetKind::Project, id, &team).await?;
        tx.commit().await?;

        tracing::info!(project_id = id, "Project updated");
        Self::require(pool, id).await
    }

    /// Delete a project together with its tasks and every junction row.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<(), DbError> {
        const CASCADE: &[&str] = &[
            "DELETE FROM task_curators WHERE task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
            "DELETE FROM task_assignees WHERE task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
            "DELETE FROM tasks WHERE project_id = ?",
            "DELETE FROM project_curators WHERE project_id = ?",
            "DELETE FROM project_assignees WHERE project_id = ?",
        ];

        let mut tx = begin_write(pool).await?;
        for stmt in CASCADE {
            sqlx::query(stmt).bind(id).execute(&mut *tx).await?;
        }
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Project", id));
        }
        tx.commit().await?;

        tracing::info!(project_id = id, "Project deleted");
        Ok(())
    }

    /// Close a project and mark every one of its tasks done.
    ///
    /// Returns the number of tasks touched.
    pub async fn close(pool: &DbPool, id: DbId) -> Result<u64, DbError> {
        let mut tx = begin_write(pool).await?;
        let tasks = close_in_tx(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(project_id = id, tasks_closed = tasks, "Project closed");
        Ok(tasks)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<ProjectWithTeam>, sqlx::Error> {
        let query = format!("{SELECT_PROJECTS} WHERE p.id = ?");
        let row = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(project) => Ok(attach_teams(pool, vec![project]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Department of an existing project, for authorization.
    pub async fn scope(pool: &DbPool, id: DbId) -> Result<Option<ProjectScope>, sqlx::Error> {
        sqlx::query_as::<_, ProjectScope>("SELECT id, department_id FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects visible under `scope`, ordered by id.
    pub async fn list(pool: &DbPool, scope: ListScope) -> Result<Vec<ProjectWithTeam>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_PROJECTS);
        match scope {
            ListScope::All => {}
            ListScope::Department(department_id) => {
                qb.push(" WHERE p.department_id = ").push_bind(department_id);
            }
            ListScope::Participant(user_id) => {
                qb.push(
                    " WHERE (EXISTS (SELECT 1 FROM project_curators pc
                                     WHERE pc.project_id = p.id AND pc.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    ") OR EXISTS (SELECT 1 FROM project_assignees pa
                                  WHERE pa.project_id = p.id AND pa.user_id = ",
                )
                .push_bind(user_id)
                .push("))");
            }
        }
        qb.push(" ORDER BY p.id");

        let projects: Vec<Project> = qb.build_query_as().fetch_all(pool).await?;
        attach_teams(pool, projects).await
    }

    async fn require(pool: &DbPool, id: DbId) -> Result<ProjectWithTeam, DbError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Project", id))
    }
}

/// Set the project Closed and cascade Done to its tasks on `conn`.
pub(crate) async fn close_in_tx(conn: &mut SqliteConnection, id: DbId) -> Result<u64, DbError> {
    let result = sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
        .bind(ProjectStatus::Closed.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Project", id));
    }
    let tasks = sqlx::query("UPDATE tasks SET status = ? WHERE project_id = ?")
        .bind(TASK_STATUS_DONE)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(tasks.rows_affected())
}

async fn attach_teams(
    pool: &DbPool,
    projects: Vec<Project>,
) -> Result<Vec<ProjectWithTeam>, sqlx::Error> {
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let mut curators = TeamRepo::members_of(pool, Junction::ProjectCurators, &ids).await?;
    let mut assignees = TeamRepo::members_of(pool, Junction::ProjectAssignees, &ids).await?;
    Ok(projects
        .into_iter()
        .map(|project| ProjectWithTeam {
            curators: curators.remove(&project.id).unwrap_or_default(),
            assignees: assignees.remove(&project.id).unwrap_or_default(),
            project,
        })
        .collect())
}
