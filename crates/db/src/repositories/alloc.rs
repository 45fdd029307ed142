//! Gap-filling id allocation inside a write transaction.

use sqlx::SqliteConnection;
use taskflow_core::ids::next_free_id;
use taskflow_core::status::{ChatScopeKind, TargetKind};
use taskflow_core::types::DbId;

/// Lowest positive id unused in `table`.
///
/// Must run on the connection of the transaction that performs the insert.
pub(crate) async fn allocate_id(
    conn: &mut SqliteConnection,
    table: &'static str,
) -> Result<DbId, sqlx::Error> {
    let query = format!("SELECT id FROM {table} ORDER BY id");
    let ids: Vec<DbId> = sqlx::query_scalar(&query).fetch_all(conn).await?;
    Ok(next_free_id(ids))
}

/// Lowest positive id free for a new project or task.
///
/// Ids still referenced by reports or chat rooms of a deleted target count
/// as taken, so a new item never inherits that history.
pub(crate) async fn allocate_target_id(
    conn: &mut SqliteConnection,
    kind: TargetKind,
) -> Result<DbId, sqlx::Error> {
    let table = match kind {
        TargetKind::Task => "tasks",
        TargetKind::Project => "projects",
    };
    let mut query = format!(
        "SELECT id FROM {table}
         UNION SELECT target_id FROM reports WHERE target_type = ?"
    );
    let chat_scope = match kind {
        TargetKind::Task => Some(ChatScopeKind::Task),
        TargetKind::Project => None,
    };
    if chat_scope.is_some() {
        query.push_str(" UNION SELECT scope_id FROM chat_messages WHERE scope_type = ?");
    }
    query.push_str(" ORDER BY 1");

    let mut q = sqlx::query_scalar::<_, DbId>(&query).bind(kind.as_str());
    if let Some(scope) = chat_scope {
        q = q.bind(scope.as_str());
    }
    let ids = q.fetch_all(conn).await?;
    Ok(next_free_id(ids))
}
