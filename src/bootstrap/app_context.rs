use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::health_probe::HealthProbe;
use crate::application::ports::product_repository::ProductRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    user_repo: Arc<dyn UserRepository>,
    product_repo: Arc<dyn ProductRepository>,
    health_probe: Arc<dyn HealthProbe>,
    started_at: Instant,
}

impl AppServices {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        product_repo: Arc<dyn ProductRepository>,
        health_probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            user_repo,
            product_repo,
            health_probe,
            started_at: Instant::now(),
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn product_repo(&self) -> Arc<dyn ProductRepository> {
        self.services.product_repo.clone()
    }

    pub fn health_probe(&self) -> Arc<dyn HealthProbe> {
        self.services.health_probe.clone()
    }

    pub fn uptime_secs(&self) -> f64 {
        self.services.started_at.elapsed().as_secs_f64()
    }
}
