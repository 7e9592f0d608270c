use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{ApiError, JsonBody};
use crate::application::use_cases::auth::login::Login as LoginUc;
use crate::application::use_cases::auth::me::GetMe;
use crate::application::use_cases::auth::register::Register as RegisterUc;
use crate::application::validation::users::{LoginRequest, RegisterRequest, RegistrationInvalid};
use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::Config;
use crate::domain::users::user::User;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "User")]
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub status: &'static str,
    pub data: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(ctx)
}

#[utoipa::path(post, path = "/api/v1/users/register", tag = "Auth", request_body = RegisterRequest, security(()), responses(
    (status = 201, body = AuthResponse),
    (status = 400, description = "Missing fields, rule violations or duplicate account")
))]
pub async fn register(
    State(ctx): State<AppContext>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Response, ApiError> {
    let account = req.into_account().map_err(|e| match e {
        RegistrationInvalid::MissingFields => ApiError::bad_request(
            "Please provide all required fields: username, email, and password.",
        ),
        RegistrationInvalid::Rules(errors) => {
            ApiError::bad_request("Validation failed.").with_errors(errors)
        }
    })?;
    let repo = ctx.user_repo();
    let uc = RegisterUc {
        repo: repo.as_ref(),
    };
    let user = uc
        .execute(&account)
        .await
        .map_err(|e| ApiError::auth(e, "Registration failed. Please try again later"))?;
    tracing::info!(user_id = %user.id, "user_registered");
    send_token(
        &ctx.cfg,
        user,
        StatusCode::CREATED,
        "User registered successfully.",
        "Registration failed. Please try again later",
    )
}

#[utoipa::path(post, path = "/api/v1/users/login", tag = "Auth", request_body = LoginRequest, security(()), responses(
    (status = 200, body = AuthResponse),
    (status = 401, description = "Invalid credentials")
))]
pub async fn login(
    State(ctx): State<AppContext>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, ApiError> {
    let creds = req
        .into_credentials()
        .ok_or_else(|| ApiError::bad_request("Please provide both email and password."))?;
    let repo = ctx.user_repo();
    let uc = LoginUc {
        repo: repo.as_ref(),
    };
    let user = uc
        .execute(&creds)
        .await
        .map_err(|e| ApiError::internal("Login failed. Please try again later", e))?
        .ok_or_else(|| {
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid username or password.")
        })?;
    send_token(
        &ctx.cfg,
        user,
        StatusCode::OK,
        "Login successful",
        "Login failed. Please try again later",
    )
}

#[utoipa::path(post, path = "/api/v1/users/logout", tag = "Auth", security(()), responses((status = 200, body = MessageResponse)))]
pub async fn logout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("jwt=loggedout; Path=/; Max-Age=10; HttpOnly"),
    );
    (
        headers,
        Json(MessageResponse {
            status: "success",
            message: "Logged out successfully",
        }),
    )
}

#[utoipa::path(get, path = "/api/v1/users/me", tag = "Auth", responses((status = 200, body = MeResponse)))]
pub async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        status: "success",
        data: user.into(),
    })
}

fn send_token(
    cfg: &Config,
    user: User,
    status: StatusCode,
    message: &'static str,
    failure: &'static str,
) -> Result<Response, ApiError> {
    let token = issue_token(cfg, user.id).map_err(|e| ApiError::internal(failure, e))?;
    let cookie = build_jwt_cookie(&token, cfg.jwt_expires_secs, cfg.is_production());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| ApiError::internal(failure, e))?,
    );
    Ok((
        status,
        headers,
        Json(AuthResponse {
            status: "success",
            message,
            token,
            user: user.into(),
        }),
    )
        .into_response())
}

// --- JWT utils ---

pub fn issue_token(cfg: &Config, user_id: Uuid) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Some(user_id.to_string()),
        iat: now,
        exp: now + cfg.jwt_expires_secs,
        nbf: None,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )?)
}

fn verify_token(cfg: &Config, token: &str) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(cfg.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation.validate_nbf = true;
    match jsonwebtoken::decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => Err(match e.kind() {
            ErrorKind::ExpiredSignature => {
                let err = ApiError::unauthorized(
                    "TOKEN_EXPIRED",
                    "Token has expired. Please log in again to get a new token.",
                );
                match expired_at(token, &key) {
                    Some(at) => err.with_expired_at(at),
                    None => err,
                }
            }
            ErrorKind::ImmatureSignature => ApiError::unauthorized(
                "TOKEN_NOT_ACTIVE",
                "Token is not yet active. Please try again later.",
            ),
            _ => ApiError::unauthorized(
                "INVALID_TOKEN",
                "Invalid token. The token is malformed or has been tampered with.",
            ),
        }),
    }
}

// Signature was already checked; only the expiry is skipped.
fn expired_at(token: &str, key: &DecodingKey) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    let data = jsonwebtoken::decode::<Claims>(token, key, &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp, 0)
}

// --- Guard ---

/// The account behind a valid `Authorization: Bearer` token.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized(
                    "NO_AUTH_HEADER",
                    "Access denied. No authorization header provided.",
                )
            })?;
        let token = raw.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::unauthorized(
                "INVALID_AUTH_FORMAT",
                "Invalid authorization format. Expected format: 'Bearer <token>'",
            )
        })?;
        // Only the first space-separated segment after the scheme counts.
        let token = token.split(' ').next().unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::unauthorized(
                "EMPTY_TOKEN",
                "Access denied. Token is missing or empty.",
            ));
        }

        let claims = verify_token(&ctx.cfg, token)?;
        let user_id = claims
            .sub
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                ApiError::unauthorized(
                    "INVALID_TOKEN_PAYLOAD",
                    "Invalid token payload. User ID is missing.",
                )
            })?;

        let repo = ctx.user_repo();
        let uc = GetMe {
            repo: repo.as_ref(),
        };
        let user = uc
            .execute(user_id)
            .await
            .map_err(|e| {
                ApiError::internal(
                    "An error occurred while verifying user credentials.",
                    e,
                )
                .with_code("DB_ERROR")
            })?
            .ok_or_else(|| {
                ApiError::unauthorized(
                    "USER_NOT_FOUND",
                    "The user belonging to this token no longer exists. Please log in again.",
                )
            })?;
        Ok(AuthUser(user))
    }
}

// --- Cookie helpers ---

fn build_jwt_cookie(token: &str, max_age_secs: i64, production: bool) -> String {
    let site_attrs = if production {
        "; Secure; SameSite=None"
    } else {
        "; SameSite=Lax"
    };
    format!(
        "jwt={}; Path=/; Max-Age={}; HttpOnly{}",
        token,
        max_age_secs.max(0),
        site_attrs
    )
}
