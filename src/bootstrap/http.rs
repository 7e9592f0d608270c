use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use axum::middleware::{from_fn, from_fn_with_state};
use http::HeaderValue;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::{Config, RateLimitConfig};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::rate_limit::{
    AUTH_MESSAGE, ClientRateLimiter, GENERAL_MESSAGE, rate_limit,
};
use crate::presentation::http::security::security_headers;
use crate::presentation::http::{auth, health, products};

#[derive(OpenApi)]
#[openapi(
        paths(
            crate::presentation::http::health::health,
            crate::presentation::http::auth::register,
            crate::presentation::http::auth::login,
            crate::presentation::http::auth::logout,
            crate::presentation::http::auth::me,
            crate::presentation::http::products::list_products,
            crate::presentation::http::products::create_products,
            crate::presentation::http::products::get_product,
            crate::presentation::http::products::update_product,
            crate::presentation::http::products::delete_product,
        ),
        components(schemas(
            crate::application::validation::users::RegisterRequest,
            crate::application::validation::users::LoginRequest,
            crate::application::validation::products::CreateProductRequest,
            crate::application::validation::products::UpdateProductRequest,
            crate::application::validation::products::GalleryImageInput,
            crate::presentation::http::auth::UserResponse,
            crate::presentation::http::auth::AuthResponse,
            crate::presentation::http::auth::MeResponse,
            crate::presentation::http::auth::MessageResponse,
            crate::presentation::http::products::OwnerResponse,
            crate::presentation::http::products::ProductResponse,
            crate::presentation::http::products::ProductListResponse,
            crate::presentation::http::products::ProductEnvelope,
            crate::presentation::http::products::ProductsCreatedResponse,
            crate::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Auth", description = "Registration, login and session"),
            (name = "Products", description = "Product catalog management"),
            (name = "Health", description = "System health checks")
        )
    )]
pub struct ApiDoc;

/// Limiters shared between the router and the pruning task.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: ClientRateLimiter,
    pub auth: ClientRateLimiter,
}

impl RateLimiters {
    pub fn from_config(cfg: &RateLimitConfig) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        let window = Duration::from_secs(cfg.window_secs);
        Some(Self {
            general: ClientRateLimiter::new(cfg.general_limit, window, GENERAL_MESSAGE),
            auth: ClientRateLimiter::new(cfg.auth_limit, window, AUTH_MESSAGE),
        })
    }

    pub fn prune(&self) -> usize {
        self.general.prune() + self.auth.prune()
    }
}

pub fn build_router(ctx: AppContext, limiters: Option<&RateLimiters>) -> Router {
    let cfg = ctx.cfg.clone();

    let mut users = auth::routes(ctx.clone());
    if let Some(l) = limiters {
        users = users.layer(from_fn_with_state(l.auth.clone(), rate_limit));
    }
    let mut api = Router::new()
        .nest("/v1/users", users)
        .nest("/v1/products", products::routes(ctx.clone()));
    if let Some(l) = limiters {
        api = api.layer(from_fn_with_state(l.general.clone(), rate_limit));
    }

    Router::new()
        .merge(health::routes(ctx))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(cfg.body_limit_bytes))
        .layer(from_fn(security_headers))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&cfg))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        )
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Local frontend dev server, allowed when `FRONTEND_URL` is unset outside production.
pub const DEV_FRONTEND_ORIGIN: &str = "http://localhost:5173";

fn cors_layer(cfg: &Config) -> CorsLayer {
    let origin = match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(v)) => AllowOrigin::exact(v),
        Some(Err(_)) | None if cfg.is_production() => {
            // FRONTEND_URL is checked at startup; deny everything if it still fails to parse
            AllowOrigin::exact(HeaderValue::from_static("http://invalid"))
        }
        _ => AllowOrigin::exact(HeaderValue::from_static(DEV_FRONTEND_ORIGIN)),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(24 * 60 * 60))
}
