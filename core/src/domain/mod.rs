pub mod authentication;
pub mod common;
pub mod nutrition;
pub mod subscription;
