//! Credential handling. Identity is carried per request by the actor header,
//! so only password hashing lives here.

pub mod password;
