pub mod auth;
pub mod http;
pub mod subscription_middleware;
