// handlers/protected/mod.rs - every handler here runs behind
// session_auth_middleware and receives the live Session as an extension.
pub mod auth;
pub mod records;
