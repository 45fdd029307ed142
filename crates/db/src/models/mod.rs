//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` struct matching what the listing queries return
//! - An input struct the repositories validate before writing

pub mod attachment;
pub mod chat;
pub mod department;
pub mod member;
pub mod project;
pub mod report;
pub mod task;
pub mod user;
