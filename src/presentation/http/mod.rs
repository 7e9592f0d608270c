pub mod auth;
pub mod error;
pub mod health;
pub mod products;
pub mod rate_limit;
pub mod security;
