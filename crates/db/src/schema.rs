//! Idempotent schema creation and legacy-row backfill.
//!
//! Runs at every startup. Tables are created only when absent, columns added
//! after the first release are added only when missing, and nothing is ever
//! dropped. Backfill statements normalise rows written by older versions and
//! are safe to repeat.

use sqlx::Row;
use taskflow_core::positions::DEPARTMENTS;

use crate::DbPool;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS departments (
        id   INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        login         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name     TEXT NOT NULL,
        position      TEXT NOT NULL DEFAULT '',
        role          TEXT NOT NULL DEFAULT 'Member',
        department_id INTEGER NOT NULL DEFAULT 1 REFERENCES departments(id),
        avatar_path   TEXT,
        created_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id              INTEGER PRIMARY KEY,
        key             TEXT NOT NULL UNIQUE,
        name            TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'Active',
        department_id   INTEGER NOT NULL DEFAULT 1 REFERENCES departments(id),
        curator_user_id INTEGER NOT NULL REFERENCES users(id),
        created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id              INTEGER PRIMARY KEY,
        key             TEXT NOT NULL UNIQUE,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL DEFAULT '',
        task_type       TEXT NOT NULL DEFAULT '',
        status          TEXT NOT NULL DEFAULT '',
        priority        TEXT NOT NULL DEFAULT '',
        due_date        TEXT,
        project_id      INTEGER NOT NULL REFERENCES projects(id),
        curator_user_id INTEGER NOT NULL REFERENCES users(id),
        created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS project_curators (
        project_id INTEGER NOT NULL REFERENCES projects(id),
        user_id    INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (project_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS project_assignees (
        project_id INTEGER NOT NULL REFERENCES projects(id),
        user_id    INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (project_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS task_curators (
        task_id INTEGER NOT NULL REFERENCES tasks(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (task_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS task_assignees (
        task_id INTEGER NOT NULL REFERENCES tasks(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (task_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS reports (
        id             INTEGER PRIMARY KEY,
        target_type    TEXT NOT NULL,
        target_id      INTEGER NOT NULL,
        result_status  TEXT NOT NULL DEFAULT 'fully complete',
        author_user_id INTEGER NOT NULL REFERENCES users(id),
        title          TEXT NOT NULL,
        resolution     TEXT NOT NULL DEFAULT '',
        file_name      TEXT,
        file_path      TEXT,
        file_size      INTEGER,
        created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS chat_messages (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        scope_type     TEXT NOT NULL,
        scope_id       INTEGER NOT NULL,
        author_user_id INTEGER NOT NULL REFERENCES users(id),
        body           TEXT NOT NULL DEFAULT '',
        file_name      TEXT,
        file_path      TEXT,
        file_size      INTEGER,
        created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_project_curators_user ON project_curators(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_project_assignees_user ON project_assignees(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_task_curators_user ON task_curators(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_task_assignees_user ON task_assignees(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reports_target ON reports(target_type, target_id)",
    "CREATE INDEX IF NOT EXISTS idx_chat_scope ON chat_messages(scope_type, scope_id, created_at)",
];

/// Columns that older databases may lack: (table, column, definition).
///
/// `ALTER TABLE ADD COLUMN` cannot carry a `REFERENCES` clause with a
/// non-null default, so added columns are plain.
const LATE_COLUMNS: &[(&str, &str, &str)] = &[
    ("projects", "status", "TEXT NOT NULL DEFAULT 'Active'"),
    ("projects", "department_id", "INTEGER NOT NULL DEFAULT 1"),
    ("users", "department_id", "INTEGER NOT NULL DEFAULT 1"),
    ("users", "avatar_path", "TEXT"),
    ("reports", "result_status", "TEXT NOT NULL DEFAULT 'fully complete'"),
];

const BACKFILL: &[&str] = &[
    "UPDATE projects SET status = 'Active'
     WHERE status IS NULL OR TRIM(status) = '' OR status = 'Активен'",
    "UPDATE projects SET status = 'Closed' WHERE status = 'Закрыт'",
    "UPDATE projects SET department_id = 1 WHERE department_id IS NULL OR department_id = 0",
    "UPDATE users SET department_id = 1 WHERE department_id IS NULL OR department_id = 0",
    "UPDATE users SET role = 'Member' WHERE role IS NULL OR TRIM(role) = ''",
    "UPDATE reports SET result_status = 'fully complete'
     WHERE result_status IS NULL OR TRIM(result_status) = '' OR result_status = 'Завершено'",
    "UPDATE reports SET result_status = 'partially complete'
     WHERE result_status = 'Завершено не полностью'",
    "UPDATE reports SET result_status = 'not complete' WHERE result_status = 'Не завершено'",
];

/// Bring the schema up to date and normalise legacy rows.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    for ddl in CREATE_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    for (table, column, definition) in LATE_COLUMNS {
        add_column_if_missing(pool, table, column, definition).await?;
    }
    for ddl in CREATE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    seed_departments(pool).await?;

    for stmt in BACKFILL {
        let result = sqlx::query(stmt).execute(pool).await?;
        if result.rows_affected() > 0 {
            tracing::info!(rows = result.rows_affected(), statement = %stmt, "Backfilled legacy rows");
        }
    }

    tracing::debug!("Schema is up to date");
    Ok(())
}

/// Add `column` to `table` when `PRAGMA table_info` does not list it.
async fn add_column_if_missing(
    pool: &DbPool,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<(), sqlx::Error> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;
    let present = rows
        .iter()
        .any(|row| row.get::<String, _>("name").eq_ignore_ascii_case(column));
    if present {
        return Ok(());
    }

    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
        .execute(pool)
        .await?;
    tracing::info!(table, column, "Added missing column");
    Ok(())
}

/// Insert the fixed department set and correct drifted names.
async fn seed_departments(pool: &DbPool) -> Result<(), sqlx::Error> {
    for dept in DEPARTMENTS {
        sqlx::query("INSERT OR IGNORE INTO departments (id, name) VALUES (?, ?)")
            .bind(dept.id)
            .bind(dept.name)
            .execute(pool)
            .await?;
        sqlx::query("UPDATE departments SET name = ? WHERE id = ? AND name <> ?")
            .bind(dept.name)
            .bind(dept.id)
            .bind(dept.name)
            .execute(pool)
            .await?;
    }
    Ok(())
}
