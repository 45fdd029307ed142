//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` as the first argument. Multi-statement writes open one
//! `BEGIN IMMEDIATE` transaction and run every step on it; an early return
//! drops the transaction, which rolls it back.

mod alloc;
pub mod chat_repo;
pub mod department_repo;
pub mod project_repo;
pub mod report_repo;
pub mod task_repo;
pub mod team_repo;
pub mod user_repo;

pub use chat_repo::ChatRepo;
pub use department_repo::DepartmentRepo;
pub use project_repo::ProjectRepo;
pub use report_repo::ReportRepo;
pub use task_repo::TaskRepo;
pub use team_repo::{Junction, TeamRepo};
pub use user_repo::UserRepo;
