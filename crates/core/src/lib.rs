//! Domain rules for the task tracker: roles, the department catalogue,
//! value sets, team validation and the authorization engine.
//!
//! Nothing in this crate touches the database. The store crate reads the
//! facts these functions decide on.

pub mod authz;
pub mod blob;
pub mod error;
pub mod ids;
pub mod membership;
pub mod positions;
pub mod roles;
pub mod status;
pub mod types;
