use sqlx::{Pool, Postgres};

use crate::application::ports::errors::UniqueViolation;

pub type PgPool = Pool<Postgres>;

pub async fn connect_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Uses compile-time embedded migrations under ./migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Turns a unique-index rejection into `UniqueViolation`, anything else passes through.
pub(crate) fn map_write_error(err: sqlx::Error) -> anyhow::Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return UniqueViolation::new(db.constraint().unwrap_or_default()).into();
        }
    }
    err.into()
}

pub mod repositories;
