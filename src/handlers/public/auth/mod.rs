// handlers/public/auth/mod.rs - session acquisition
pub mod login;
pub mod register;

pub use login::{login, LoginRequest, LoginResponse};
pub use register::{register, RegisterRequest};
