use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{error, info};

use catalog_api::bootstrap::app_context::{AppContext, AppServices};
use catalog_api::bootstrap::config::Config;
use catalog_api::bootstrap::http::{RateLimiters, build_router};
use catalog_api::infrastructure::db::repositories::health_probe_sqlx::SqlxHealthProbe;
use catalog_api::infrastructure::db::repositories::product_repository_sqlx::SqlxProductRepository;
use catalog_api::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "catalog_api=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        port = cfg.api_port,
        environment = cfg.environment.as_str(),
        rate_limit = cfg.rate_limit.enabled,
        "Starting catalog API"
    );

    // Database
    let pool = catalog_api::infrastructure::db::connect_pool(&cfg.database_url).await?;
    catalog_api::infrastructure::db::migrate(&pool).await?;

    let services = AppServices::new(
        Arc::new(SqlxUserRepository::new(pool.clone())),
        Arc::new(SqlxProductRepository::new(pool.clone())),
        Arc::new(SqlxHealthProbe::new(pool.clone())),
    );
    let ctx = AppContext::new(cfg.clone(), services);

    let limiters = RateLimiters::from_config(&cfg.rate_limit);
    let app = build_router(ctx, limiters.as_ref());

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    let api_handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    });

    // Background pruning of idle rate-limit keys
    let prune_handle = limiters.map(|limiters| {
        tokio::spawn(async move {
            loop {
                sleep(PRUNE_INTERVAL).await;
                let tracked = limiters.prune();
                tracing::debug!(tracked, "rate_limit_keys_pruned");
            }
        })
    });

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(?e, "API server task failed"),
        Err(e) => error!(?e, "API server task panicked"),
    }

    if let Some(handle) = prune_handle {
        handle.abort();
    }
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
