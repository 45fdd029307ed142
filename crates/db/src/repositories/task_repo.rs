//! Repository for the `tasks` table and its junction sets.
//!
//! A task has no department column; it inherits its project's.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use taskflow_core::authz::ListScope;
use taskflow_core::status::{TargetKind, TASK_STATUS_DONE};
use taskflow_core::types::DbId;

use crate::error::{conflict_on_unique, DbError};
use crate::models::task::{Task, TaskInput, TaskScope, TaskWithTeam};
use crate::repositories::alloc::allocate_target_id;
use crate::repositories::team_repo::{self, Junction, TeamRepo};
use crate::{begin_write, DbPool};

const SELECT_TASKS: &str = "SELECT t.id, t.key, t.title, t.description, t.task_type, t.status,
        t.priority, t.due_date, t.project_id,
        p.key AS project_key, p.name AS project_name, p.department_id,
        COALESCE(d.name, '') AS department_name,
        t.curator_user_id,
        COALESCE(u.full_name, '') AS curator_name,
        t.created_at
     FROM tasks t
     JOIN projects p ON p.id = t.project_id
     LEFT JOIN departments d ON d.id = p.department_id
     LEFT JOIN users u ON u.id = t.curator_user_id";

/// Provides the transactional write paths and scoped listings for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task and its team in one transaction.
    ///
    /// The parent project must exist; a blank key becomes `TSK-{id}`.
    pub async fn create(pool: &DbPool, input: &TaskInput) -> Result<TaskWithTeam, DbError> {
        let team = input.validate()?;
        let mut tx = begin_write(pool).await?;

        ensure_project(&mut tx, input.project_id).await?;
        let id = allocate_target_id(&mut tx, TargetKind::Task).await?;
        let key = match input.key.trim() {
            "" => format!("TSK-{id}"),
            given => given.to_string(),
        };

        sqlx::query(
            "INSERT INTO tasks (id, key, title, description, task_type, status, priority,
                                due_date, project_id, curator_user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&key)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(input.task_type.trim())
        .bind(input.status.trim())
        .bind(input.priority.trim())
        .bind(input.due_date)
        .bind(input.project_id)
        .bind(team.primary_curator())
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Task key '{key}' already exists")))?;

        team_repo::insert_team(&mut tx, TargetKind::Task, id, &team).await?;
        tx.commit().await?;

        tracing::info!(task_id = id, key = %key, project_id = input.project_id, "Task created");
        Self::require(pool, id).await
    }

    /// Replace a task's scalar fields and reconcile both team sets.
    pub async fn update(pool: &DbPool, id: DbId, input: &TaskInput) -> Result<TaskWithTeam, DbError> {
        let team = input.validate()?;
        let key = input.key.trim();
        let mut tx = begin_write(pool).await?;

        ensure_project(&mut tx, input.project_id).await?;
        let result = sqlx::query(
            "UPDATE tasks SET
                key = COALESCE(NULLIF(?, ''), key),
                title = ?,
                description = ?,
                task_type = ?,
                status = ?,
                priority = ?,
                due_date = ?,
                project_id = ?,
                curator_user_id = ?
             WHERE id = ?",
        )
        .bind(key)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(input.task_type.trim())
        .bind(input.status.trim())
        .bind(input.priority.trim())
        .bind(input.due_date)
        .bind(input.project_id)
        .bind(team.primary_curator())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Task key '{key}' already exists")))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Task", id));
        }

        team_repo::reconcile_team(&mut tx, TargetKind::Task, id, &team).await?;
        tx.commit().await?;

        tracing::info!(task_id = id, "Task updated");
        Self::require(pool, id).await
    }

    /// Delete a task and its junction rows.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<(), DbError> {
        let mut tx = begin_write(pool).await?;
        sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM task_curators WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Task", id));
        }
        tx.commit().await?;

        tracing::info!(task_id = id, "Task deleted");
        Ok(())
    }

    /// Mark a task done. Closing an already closed task succeeds.
    pub async fn close(pool: &DbPool, id: DbId) -> Result<(), DbError> {
        let mut tx = begin_write(pool).await?;
        close_in_tx(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!(task_id = id, "Task closed");
        Ok(())
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<TaskWithTeam>, sqlx::Error> {
        let query = format!("{SELECT_TASKS} WHERE t.id = ?");
        let row = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(task) => Ok(attach_teams(pool, vec![task]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Project and inherited department of an existing task.
    pub async fn scope(pool: &DbPool, id: DbId) -> Result<Option<TaskScope>, sqlx::Error> {
        sqlx::query_as::<_, TaskScope>(
            "SELECT t.id, t.project_id, p.department_id
             FROM tasks t JOIN projects p ON p.id = t.project_id
             WHERE t.id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Tasks visible under `scope`, optionally narrowed to one project.
    pub async fn list(
        pool: &DbPool,
        scope: ListScope,
        project_id: Option<DbId>,
    ) -> Result<Vec<TaskWithTeam>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_TASKS);
        qb.push(" WHERE 1 = 1");
        if let Some(project_id) = project_id {
            qb.push(" AND t.project_id = ").push_bind(project_id);
        }
        match scope {
            ListScope::All => {}
            ListScope::Department(department_id) => {
                qb.push(" AND p.department_id = ").push_bind(department_id);
            }
            ListScope::Participant(user_id) => {
                qb.push(
                    " AND (EXISTS (SELECT 1 FROM task_curators tc
                                   WHERE tc.task_id = t.id AND tc.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    ") OR EXISTS (SELECT 1 FROM task_assignees ta
                                  WHERE ta.task_id = t.id AND ta.user_id = ",
                )
                .push_bind(user_id)
                .push("))");
            }
        }
        qb.push(" ORDER BY t.id");

        let tasks: Vec<Task> = qb.build_query_as().fetch_all(pool).await?;
        attach_teams(pool, tasks).await
    }

    async fn require(pool: &DbPool, id: DbId) -> Result<TaskWithTeam, DbError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Task", id))
    }
}

/// Set a task's status to done on `conn`.
pub(crate) async fn close_in_tx(conn: &mut SqliteConnection, id: DbId) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
        .bind(TASK_STATUS_DONE)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Task", id));
    }
    Ok(())
}

async fn ensure_project(conn: &mut SqliteConnection, project_id: DbId) -> Result<(), DbError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM projects WHERE id = ?)")
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(DbError::not_found("Project", project_id))
    }
}

async fn attach_teams(pool: &DbPool, tasks: Vec<Task>) -> Result<Vec<TaskWithTeam>, sqlx::Error> {
    let ids: Vec<DbId> = tasks.iter().map(|t| t.id).collect();
    let mut curators = TeamRepo::members_of(pool, Junction::TaskCurators, &ids).await?;
    let mut assignees = TeamRepo::members_of(pool, Junction::TaskAssignees, &ids).await?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskWithTeam {
            curators: curators.remove(&task.id).unwrap_or_default(),
            assignees: assignees.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}
