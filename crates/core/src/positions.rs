//! Department catalogue and the role/department/position compatibility table.
//!
//! The catalogue is static configuration: departments are a fixed reference
//! set, each with one reserved head position (required for Project Manager)
//! and an allow-list of positions (required for Member and Guest). Admin and
//! Deputy Admin each require one reserved position regardless of department.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Position reserved for the Admin role.
pub const ADMIN_POSITION: &str = "Начальник УЦС";

/// Position reserved for the Deputy Admin role.
pub const DEPUTY_ADMIN_POSITION: &str = "Заместитель начальника УЦС";

/// Static description of one department.
#[derive(Debug, Clone, Copy)]
pub struct DepartmentRule {
    pub id: DbId,
    pub name: &'static str,
    pub head_position: &'static str,
    pub positions: &'static [&'static str],
}

pub const DEPARTMENTS: &[DepartmentRule] = &[
    DepartmentRule {
        id: 1,
        name: "Отдел сопровождения информационных систем",
        head_position: "Начальник Отдела Поддержки текущих сервисов",
        positions: &[
            "Начальник Отдела Поддержки текущих сервисов",
            "Ведущий системный аналитик отдела Поддержки текущих сервисов",
            "Системный аналитик отдела Поддержки текущих сервисов",
            "Ведущий разработчик отдела Поддержки текущих сервисов",
            "Разработчик отдела Поддержки текущих сервисов",
            "Тестировщик отдела Поддержки текущих сервисов",
        ],
    },
    DepartmentRule {
        id: 2,
        name: "Отдел поддержки и развития инфраструктуры",
        head_position: "Начальник отдела поддержки и развития инфраструктуры",
        positions: &[
            "Начальник отдела поддержки и развития инфраструктуры",
            "Ведущий системный администратор",
            "Системный администратор",
            "Ведущий сетевой инженер",
            "Сетевой инженер",
            "Главный специалист",
        ],
    },
    DepartmentRule {
        id: 3,
        name: "Отдел технической поддержки",
        head_position: "Начальник отдела технической поддержки",
        positions: &[
            "Начальник отдела технической поддержки",
            "Главный специалист технической поддержки",
            "Специалист технической поддержки",
        ],
    },
    DepartmentRule {
        id: 4,
        name: "Отдел по обеспечению информационной безопасности",
        head_position: "Начальник отдела ООИБ",
        positions: &[
            "Начальник отдела ООИБ",
            "Зам. нач. отдела ООИБ по бумагам",
            "Зам. нач. отдела ООИБ по тех. части",
            "Главный инспектор ООИБ",
            "Инспектор ООИБ",
        ],
    },
];

/// Department id assigned to rows that predate department tracking.
pub const FALLBACK_DEPARTMENT_ID: DbId = 1;

pub fn department(id: DbId) -> Option<&'static DepartmentRule> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

pub fn is_known_department(id: DbId) -> bool {
    department(id).is_some()
}

fn same_position(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Check that `position` is compatible with `role` inside `department_id`.
///
/// The position must be non-blank and the department known for every role,
/// including Owner.
pub fn validate_role_department_position(
    role: Role,
    department_id: DbId,
    position: &str,
) -> Result<(), CoreError> {
    if position.trim().is_empty() {
        return Err(CoreError::validation("Position is required"));
    }
    if department_id <= 0 {
        return Err(CoreError::validation("Department is required"));
    }
    let dept = department(department_id).ok_or_else(|| {
        CoreError::Validation(format!("Unknown department id {department_id}"))
    })?;

    match role {
        Role::Owner => Ok(()),
        Role::Admin => {
            if same_position(position, ADMIN_POSITION) {
                Ok(())
            } else {
                Err(CoreError::Validation(format!(
                    "Role Admin requires position '{ADMIN_POSITION}'"
                )))
            }
        }
        Role::DeputyAdmin => {
            if same_position(position, DEPUTY_ADMIN_POSITION) {
                Ok(())
            } else {
                Err(CoreError::Validation(format!(
                    "Role Deputy Admin requires position '{DEPUTY_ADMIN_POSITION}'"
                )))
            }
        }
        Role::ProjectManager => {
            if same_position(position, dept.head_position) {
                Ok(())
            } else {
                Err(CoreError::Validation(format!(
                    "Role Project Manager in department {department_id} requires position '{}'",
                    dept.head_position
                )))
            }
        }
        Role::Member | Role::Guest => {
            if dept.positions.iter().any(|p| same_position(p, position)) {
                Ok(())
            } else {
                Err(CoreError::Validation(format!(
                    "Position '{}' does not belong to department {department_id}",
                    position.trim()
                )))
            }
        }
    }
}
