pub mod password;
pub mod session;

pub use password::{change_password, ChangePasswordRequest};
pub use session::{logout, whoami, WhoamiResponse};
