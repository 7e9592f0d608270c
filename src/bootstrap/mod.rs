pub mod app_context;
pub mod config;
pub mod http;
