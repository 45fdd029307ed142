//! Closed value sets stored as text columns: project status, report target
//! kind, report result status and chat scope kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Terminal task status written by every closing path.
pub const TASK_STATUS_DONE: &str = "Done";

/// Project lifecycle. `Active -> Closed` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectStatus {
    Active,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Closed => "Closed",
        }
    }

    /// Accepts the canonical names and the localized names older databases
    /// carry.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "active" | "активен" => Ok(ProjectStatus::Active),
            "closed" | "закрыт" => Ok(ProjectStatus::Closed),
            other => Err(CoreError::Validation(format!(
                "Invalid project status '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ProjectStatus::Closed
    }
}

/// What a report (or a close request) points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetKind {
    Task,
    Project,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Task => "task",
            TargetKind::Project => "project",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "task" => Ok(TargetKind::Task),
            "project" => Ok(TargetKind::Project),
            other => Err(CoreError::Validation(format!(
                "Unsupported target type '{other}'. Must be one of: task, project"
            ))),
        }
    }

    pub fn entity_name(self) -> &'static str {
        match self {
            TargetKind::Task => "Task",
            TargetKind::Project => "Project",
        }
    }
}

/// Outcome recorded by a closing report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResultStatus {
    #[default]
    FullyComplete,
    PartiallyComplete,
    NotComplete,
}

pub const VALID_RESULT_STATUSES: &[&str] =
    &["fully complete", "partially complete", "not complete"];

impl ResultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatus::FullyComplete => "fully complete",
            ResultStatus::PartiallyComplete => "partially complete",
            ResultStatus::NotComplete => "not complete",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "fully complete" | "завершено" => Ok(ResultStatus::FullyComplete),
            "partially complete" | "завершено не полностью" => {
                Ok(ResultStatus::PartiallyComplete)
            }
            "not complete" | "не завершено" => Ok(ResultStatus::NotComplete),
            _ => Err(CoreError::Validation(format!(
                "Invalid result status '{}'. Must be one of: {}",
                raw.trim(),
                VALID_RESULT_STATUSES.join(", ")
            ))),
        }
    }
}

/// Chat rooms exist per department and per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChatScopeKind {
    Department,
    Task,
}

impl ChatScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatScopeKind::Department => "department",
            ChatScopeKind::Task => "task",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "department" => Ok(ChatScopeKind::Department),
            "task" => Ok(ChatScopeKind::Task),
            other => Err(CoreError::Validation(format!("Invalid chat scope '{other}'"))),
        }
    }
}

macro_rules! string_enum_conversions {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl TryFrom<String> for $ty {
                type Error = CoreError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    <$ty>::parse(&value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }
        )*
    };
}

string_enum_conversions!(ProjectStatus, TargetKind, ResultStatus, ChatScopeKind);
