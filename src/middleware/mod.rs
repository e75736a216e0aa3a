pub mod auth;
pub mod response;

pub use auth::{extract_bearer_token, require_admin_middleware, require_writer, session_auth_middleware};
pub use response::{ApiResponse, ApiResult};
