pub mod clear;
pub mod init;
pub mod load;
pub mod migrate;
pub mod user;
