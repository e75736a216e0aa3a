// handlers/elevated/mod.rs - admin-only handlers
//
// Routed behind session_auth_middleware and require_admin_middleware.
pub mod load;
pub mod records;
pub mod users;
