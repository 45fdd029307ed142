//! Repository for the `reports` table.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use taskflow_core::authz::ListScope;
use taskflow_core::status::TargetKind;
use taskflow_core::types::DbId;

use crate::error::DbError;
use crate::models::attachment::AttachmentFile;
use crate::models::report::{CreateReport, Report};
use crate::repositories::alloc::allocate_id;
use crate::repositories::{project_repo, task_repo};
use crate::{begin_write, DbPool};

/// Joins resolving the target (task or project), its department and the
/// author. Targets may have been deleted since, hence the outer joins.
const REPORT_FROM: &str = " FROM reports r
     LEFT JOIN tasks t ON r.target_type = 'task' AND t.id = r.target_id
     LEFT JOIN projects tp ON tp.id = t.project_id
     LEFT JOIN projects p ON r.target_type = 'project' AND p.id = r.target_id
     LEFT JOIN users u ON u.id = r.author_user_id";

const REPORT_COLUMNS: &str = "SELECT r.id, r.target_type, r.target_id,
        COALESCE(CASE WHEN r.target_type = 'task' THEN t.key || ' ' || t.title
                      ELSE p.key || ' ' || p.name END, '') AS target_label,
        r.result_status,
        r.author_user_id AS author_id,
        COALESCE(u.full_name, '') AS author_name,
        r.title, r.resolution, r.file_name, r.file_size,
        COALESCE(tp.department_id, p.department_id) AS department_id,
        r.created_at";

pub struct ReportRepo;

impl ReportRepo {
    /// File a report, closing its target in the same transaction when
    /// `close_item` is set. Nothing is written if any step fails.
    pub async fn create(pool: &DbPool, input: &CreateReport) -> Result<Report, DbError> {
        input.validate()?;
        let mut tx = begin_write(pool).await?;

        if !target_exists(&mut tx, input.target_kind, input.target_id).await? {
            return Err(DbError::not_found(
                input.target_kind.entity_name(),
                input.target_id,
            ));
        }

        let id = allocate_id(&mut tx, "reports").await?;
        let attachment = input.attachment.as_ref();
        sqlx::query(
            "INSERT INTO reports (id, target_type, target_id, result_status, author_user_id,
                                  title, resolution, file_name, file_path, file_size, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(input.target_kind.as_str())
        .bind(input.target_id)
        .bind(input.result_status.as_str())
        .bind(input.author_id)
        .bind(input.title.trim())
        .bind(input.resolution.trim())
        .bind(attachment.map(|a| a.name.as_str()))
        .bind(attachment.map(|a| a.path.as_str()))
        .bind(attachment.map(|a| a.size))
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await?;

        if input.close_item {
            match input.target_kind {
                TargetKind::Task => task_repo::close_in_tx(&mut tx, input.target_id).await?,
                TargetKind::Project => {
                    project_repo::close_in_tx(&mut tx, input.target_id).await?;
                }
            }
        }
        tx.commit().await?;

        tracing::info!(
            report_id = id,
            target_type = input.target_kind.as_str(),
            target_id = input.target_id,
            closed = input.close_item,
            "Report filed"
        );
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Report", id))
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("{REPORT_COLUMNS}{REPORT_FROM} WHERE r.id = ?");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reports visible under `scope`, newest first.
    ///
    /// Participants see reports on targets they curate or execute, plus the
    /// reports they wrote themselves.
    pub async fn list(pool: &DbPool, scope: ListScope) -> Result<Vec<Report>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{REPORT_COLUMNS}{REPORT_FROM} WHERE 1 = 1"));
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");
        qb.build_query_as().fetch_all(pool).await
    }

    /// Attachment of a report visible under `scope`.
    pub async fn attachment(
        pool: &DbPool,
        id: DbId,
        scope: ListScope,
    ) -> Result<Option<AttachmentFile>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT r.file_name, r.file_path{REPORT_FROM}
             WHERE r.file_path IS NOT NULL AND r.file_name IS NOT NULL AND r.id = "
        ));
        qb.push_bind(id);
        push_scope(&mut qb, scope);
        qb.build_query_as().fetch_optional(pool).await
    }
}

fn push_scope(qb: &mut QueryBuilder<Sqlite>, scope: ListScope) {
    match scope {
        ListScope::All => {}
        ListScope::Department(department_id) => {
            qb.push(" AND COALESCE(tp.department_id, p.department_id) = ")
                .push_bind(department_id);
        }
        ListScope::Participant(user_id) => {
            qb.push(" AND (r.author_user_id = ")
                .push_bind(user_id)
                .push(
                    " OR (r.target_type = 'task' AND (
                        EXISTS (SELECT 1 FROM task_curators tc
                                WHERE tc.task_id = r.target_id AND tc.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    ") OR EXISTS (SELECT 1 FROM task_assignees ta
                                  WHERE ta.task_id = r.target_id AND ta.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    "))) OR (r.target_type = 'project' AND (
                        EXISTS (SELECT 1 FROM project_curators pc
                                WHERE pc.project_id = r.target_id AND pc.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    ") OR EXISTS (SELECT 1 FROM project_assignees pa
                                  WHERE pa.project_id = r.target_id AND pa.user_id = ",
                )
                .push_bind(user_id)
                .push("))))");
        }
    }
}

async fn target_exists(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    id: DbId,
) -> Result<bool, sqlx::Error> {
    let query = match kind {
        TargetKind::Task => "SELECT EXISTS (SELECT 1 FROM tasks WHERE id = ?)",
        TargetKind::Project => "SELECT EXISTS (SELECT 1 FROM projects WHERE id = ?)",
    };
    sqlx::query_scalar::<_, bool>(query)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}
