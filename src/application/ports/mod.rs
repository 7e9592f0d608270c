pub mod errors;
pub mod health_probe;
pub mod product_repository;
pub mod user_repository;
