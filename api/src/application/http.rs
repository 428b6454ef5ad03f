pub mod health;
pub mod nutrition;
pub mod server;
pub mod subscription;
pub mod webhook;
