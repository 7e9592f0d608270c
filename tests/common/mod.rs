#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

use catalog_api::application::ports::errors::UniqueViolation;
use catalog_api::application::ports::health_probe::HealthProbe;
use catalog_api::application::ports::product_repository::ProductRepository;
use catalog_api::application::ports::user_repository::{UserRepository, UserRow};
use catalog_api::bootstrap::app_context::{AppContext, AppServices};
use catalog_api::bootstrap::config::{Config, Environment, RateLimitConfig};
use catalog_api::bootstrap::http::{RateLimiters, build_router};
use catalog_api::domain::products::product::{
    NewProduct, Product, ProductChanges, ProductOwner,
};
use catalog_api::domain::users::user::User;
use catalog_api::presentation::http::auth::issue_token;

/// Postgres stand-in with the same uniqueness rules.
#[derive(Default)]
pub struct MemoryDb {
    users: Mutex<Vec<UserRow>>,
    products: Mutex<Vec<Product>>,
    unhealthy: AtomicBool,
    user_lookup_fails: AtomicBool,
    slug_check_is_stale: AtomicBool,
}

impl MemoryDb {
    pub fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    /// Makes `find_by_id` fail as if the connection dropped.
    pub fn fail_user_lookups(&self) {
        self.user_lookup_fails.store(true, Ordering::SeqCst);
    }

    /// Makes `existing_slugs` report nothing, so a clash only surfaces when
    /// the insert hits the unique key (another writer got there first).
    pub fn serve_stale_slug_checks(&self) {
        self.slug_check_is_stale.store(true, Ordering::SeqCst);
    }

    pub async fn product_count(&self) -> usize {
        self.products.lock().await.len()
    }

    pub async fn stored_product(&self, slug: &str) -> Option<Product> {
        self.products
            .lock()
            .await
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    /// Inserts a user without a usable password, for token-only tests.
    pub async fn seed_user(&self, username: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            created_at: now,
            updated_at: now,
        };
        self.users.lock().await.push(UserRow {
            user: user.clone(),
            password_hash: None,
        });
        user
    }

    pub async fn remove_user(&self, id: Uuid) {
        self.users.lock().await.retain(|row| row.user.id != id);
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut users = self.users.lock().await;
        if users.iter().any(|row| row.user.email == email) {
            return Err(UniqueViolation::new("users_email_key").into());
        }
        if users.iter().any(|row| row.user.username == username) {
            return Err(UniqueViolation::new("users_username_key").into());
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            created_at: now,
            updated_at: now,
        };
        users.push(UserRow {
            user: user.clone(),
            password_hash: Some(password_hash.into()),
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|row| row.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        if self.user_lookup_fails.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset while loading user {id}");
        }
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|row| row.user.id == id)
            .map(|row| row.user.clone()))
    }
}

#[async_trait]
impl ProductRepository for MemoryDb {
    async fn list_all(&self) -> anyhow::Result<Vec<Product>> {
        Ok(self.products.lock().await.iter().rev().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn existing_slugs(&self, slugs: &[String]) -> anyhow::Result<Vec<String>> {
        if self.slug_check_is_stale.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .filter(|p| slugs.contains(&p.slug))
            .map(|p| p.slug.clone())
            .collect())
    }

    async fn slug_taken_by_other(&self, slug: &str, exclude_id: Uuid) -> anyhow::Result<bool> {
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .any(|p| p.slug == slug && p.id != exclude_id))
    }

    async fn insert_many(
        &self,
        owner_id: Uuid,
        products: &[NewProduct],
    ) -> anyhow::Result<Vec<Product>> {
        let owner = self
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("owner {owner_id} missing"))?;
        let mut stored = self.products.lock().await;
        if products
            .iter()
            .any(|n| stored.iter().any(|p| p.slug == n.slug))
        {
            return Err(UniqueViolation::new("products_slug_key").into());
        }
        let now = Utc::now();
        let created: Vec<Product> = products
            .iter()
            .map(|n| Product {
                id: Uuid::new_v4(),
                meta_title: n.meta_title.clone(),
                product_name: n.product_name.clone(),
                slug: n.slug.clone(),
                gallery_images: n.gallery_images.clone(),
                price: n.price,
                discounted_price: n.discounted_price,
                description: n.description.clone(),
                is_active: n.is_active,
                created_by: ProductOwner {
                    id: owner.id,
                    username: owner.username.clone(),
                    email: owner.email.clone(),
                },
                created_at: now,
                updated_at: now,
            })
            .collect();
        stored.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &ProductChanges) -> anyhow::Result<Option<Product>> {
        let mut stored = self.products.lock().await;
        let Some(p) = stored.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.meta_title {
            p.meta_title = v.clone();
        }
        if let Some(v) = &changes.product_name {
            p.product_name = v.clone();
        }
        if let Some(v) = &changes.slug {
            p.slug = v.clone();
        }
        if let Some(v) = &changes.gallery_images {
            p.gallery_images = v.clone();
        }
        if let Some(v) = changes.price {
            p.price = v;
        }
        if let Some(v) = changes.discounted_price {
            p.discounted_price = v;
        }
        if let Some(v) = &changes.description {
            p.description = v.clone();
        }
        if let Some(v) = changes.is_active {
            p.is_active = v;
        }
        p.updated_at = Utc::now();
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut stored = self.products.lock().await;
        let before = stored.len();
        stored.retain(|p| p.id != id);
        Ok(stored.len() != before)
    }
}

#[async_trait]
impl HealthProbe for MemoryDb {
    async fn ping(&self) -> anyhow::Result<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            anyhow::bail!("database unreachable");
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        api_port: 0,
        frontend_url: Some("http://localhost:5173".into()),
        database_url: String::new(),
        jwt_secret: "integration-test-secret".into(),
        jwt_expires_secs: 7 * 24 * 60 * 60,
        body_limit_bytes: 10 * 1024,
        environment: Environment::Test,
        rate_limit: RateLimitConfig {
            enabled: false,
            window_secs: 900,
            general_limit: 100,
            auth_limit: 10,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<MemoryDb>,
    pub cfg: Config,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn app() -> TestApp {
    app_with(test_config())
}

pub fn app_with(cfg: Config) -> TestApp {
    let db = Arc::new(MemoryDb::default());
    let services = AppServices::new(db.clone(), db.clone(), db.clone());
    let ctx = AppContext::new(cfg.clone(), services);
    let limiters = RateLimiters::from_config(&cfg.rate_limit);
    TestApp {
        router: build_router(ctx, limiters.as_ref()),
        db,
        cfg,
    }
}

// Helper to parse JSON response body
pub async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = json_body(response.into_body()).await;
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Seeds a user and returns it with a valid token.
    pub async fn signed_in(&self, username: &str) -> (User, String) {
        let user = self
            .db
            .seed_user(username, &format!("{username}@example.com"))
            .await;
        let token = issue_token(&self.cfg, user.id).unwrap();
        (user, token)
    }
}

pub fn product_json(slug: &str) -> Value {
    json!({
        "metaTitle": "Handmade mug",
        "productName": "Stoneware Mug",
        "slug": slug,
        "price": 24.5,
        "description": "<p>A sturdy mug glazed by hand.</p>",
        "galleryImages": [
            { "url": "https://cdn.example.com/mug.jpg", "alt": "Mug" }
        ]
    })
}
