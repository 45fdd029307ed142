//! Request extractors.
//!
//! - [`actor::CurrentActor`] -- resolves the acting user from the
//!   `X-Actor-Login` header.

pub mod actor;
