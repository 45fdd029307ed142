//! Repository for the `users` table.

use sqlx::{QueryBuilder, Sqlite};
use taskflow_core::authz::ListScope;
use taskflow_core::positions::{validate_role_department_position, FALLBACK_DEPARTMENT_ID};
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;

use crate::error::{conflict_on_unique, integrity_on_foreign_key, DbError};
use crate::models::user::{CreateUser, UpdateProfile, UpdateUser, User, UserResponse};
use crate::{begin_write, DbPool};

/// Column list for the full row, password hash included.
const COLUMNS: &str = "id, login, password_hash, full_name, position, role, department_id, \
                       avatar_path, created_at";

const SELECT_RESPONSE: &str = "SELECT u.id, u.login, u.full_name, u.position, u.role,
        u.department_id, COALESCE(d.name, '') AS department_name,
        (u.avatar_path IS NOT NULL) AS has_avatar, u.created_at
     FROM users u
     LEFT JOIN departments d ON d.id = u.department_id";

/// Position given to the account created from bootstrap settings.
pub const BOOTSTRAP_OWNER_POSITION: &str = "Owner";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user. A taken login is a conflict.
    pub async fn create(pool: &DbPool, input: &CreateUser) -> Result<UserResponse, DbError> {
        input.validate()?;
        let login = input.login.trim();
        let result = sqlx::query(
            "INSERT INTO users (login, password_hash, full_name, position, role, department_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(login)
        .bind(&input.password_hash)
        .bind(input.full_name.trim())
        .bind(input.position.trim())
        .bind(input.role.as_str())
        .bind(input.department_id)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Login '{login}' is already taken")))?;

        let id = result.last_insert_rowid();
        tracing::info!(user_id = id, login = %login, role = %input.role, "User created");
        Self::require_response(pool, id).await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_login(pool: &DbPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE login = ?");
        sqlx::query_as::<_, User>(&query)
            .bind(login.trim())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_response(pool: &DbPool, id: DbId) -> Result<Option<UserResponse>, sqlx::Error> {
        let query = format!("{SELECT_RESPONSE} WHERE u.id = ?");
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Users visible under `scope`, ordered by full name.
    pub async fn list(pool: &DbPool, scope: ListScope) -> Result<Vec<UserResponse>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_RESPONSE);
        match scope {
            ListScope::All => {}
            ListScope::Department(department_id) => {
                qb.push(" WHERE u.department_id = ").push_bind(department_id);
            }
            ListScope::Participant(user_id) => {
                qb.push(" WHERE u.id = ").push_bind(user_id);
            }
        }
        qb.push(" ORDER BY u.full_name, u.id");
        qb.build_query_as().fetch_all(pool).await
    }

    /// Administrative edit replacing login, name, position, role and
    /// department.
    pub async fn update(pool: &DbPool, id: DbId, input: &UpdateUser) -> Result<UserResponse, DbError> {
        input.validate()?;
        let login = input.login.trim();
        let result = sqlx::query(
            "UPDATE users SET login = ?, full_name = ?, position = ?, role = ?, department_id = ?
             WHERE id = ?",
        )
        .bind(login)
        .bind(input.full_name.trim())
        .bind(input.position.trim())
        .bind(input.role.as_str())
        .bind(input.department_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Login '{login}' is already taken")))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        tracing::info!(user_id = id, role = %input.role, "User updated");
        Self::require_response(pool, id).await
    }

    /// Change only the role. The user's current position must suit it.
    pub async fn update_role(pool: &DbPool, id: DbId, role: Role) -> Result<UserResponse, DbError> {
        let user = Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;
        validate_role_department_position(role, user.department_id, &user.position)?;

        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        tracing::info!(user_id = id, role = %role, "User role changed");
        Self::require_response(pool, id).await
    }

    /// Self-service edit of name, position and optionally the password.
    pub async fn update_profile(
        pool: &DbPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<UserResponse, DbError> {
        let result = sqlx::query(
            "UPDATE users SET full_name = ?, position = ?,
                              password_hash = COALESCE(?, password_hash)
             WHERE id = ?",
        )
        .bind(input.full_name.trim())
        .bind(input.position.trim())
        .bind(input.password_hash.as_deref())
        .bind(id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        tracing::info!(
            user_id = id,
            password_changed = input.password_hash.is_some(),
            "Profile updated"
        );
        Self::require_response(pool, id).await
    }

    /// Store a new avatar path and return the one it replaced.
    pub async fn set_avatar(pool: &DbPool, id: DbId, path: &str) -> Result<Option<String>, DbError> {
        let mut tx = begin_write(pool).await?;
        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_path FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous) = previous else {
            return Err(DbError::not_found("User", id));
        };
        sqlx::query("UPDATE users SET avatar_path = ? WHERE id = ?")
            .bind(path)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = id, "Avatar updated");
        Ok(previous)
    }

    /// Delete a user. Refused while any row still references them.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                integrity_on_foreign_key(e, || {
                    format!("User {id} is still referenced by projects, tasks or reports")
                })
            })?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Create an Owner account with `login` unless one already exists.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_owner(
        pool: &DbPool,
        login: &str,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        if Self::find_by_login(pool, login).await?.is_some() {
            return Ok(false);
        }
        let input = CreateUser {
            login: login.trim().to_string(),
            password_hash: password_hash.to_string(),
            full_name: login.trim().to_string(),
            position: BOOTSTRAP_OWNER_POSITION.to_string(),
            role: Role::Owner,
            department_id: FALLBACK_DEPARTMENT_ID,
        };
        Self::create(pool, &input).await?;
        Ok(true)
    }

    async fn require_response(pool: &DbPool, id: DbId) -> Result<UserResponse, DbError> {
        Self::find_response(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }
}
