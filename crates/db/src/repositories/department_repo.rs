//! Repository for the static `departments` table.

use taskflow_core::authz::ListScope;
use taskflow_core::types::DbId;

use crate::models::department::Department;
use crate::DbPool;

pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn list(pool: &DbPool, scope: ListScope) -> Result<Vec<Department>, sqlx::Error> {
        match scope {
            ListScope::All => {
                sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY id")
                    .fetch_all(pool)
                    .await
            }
            ListScope::Department(department_id) => {
                sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = ?")
                    .bind(department_id)
                    .fetch_all(pool)
                    .await
            }
            ListScope::Participant(user_id) => {
                sqlx::query_as::<_, Department>(
                    "SELECT d.id, d.name FROM departments d
                     JOIN users u ON u.department_id = d.id
                     WHERE u.id = ?",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
