use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::use_cases::auth::AuthError;
use crate::application::use_cases::products::ProductError;
use crate::application::validation::FieldError;

/// Error half of the response envelope. 4xx render as `fail`, 5xx as `error`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub field: Option<&'static str>,
    pub index: Option<usize>,
    pub code: Option<&'static str>,
    pub errors: Option<Vec<String>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub retry_after: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expired_at: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field: None,
            index: None,
            code: None,
            errors: None,
            expired_at: None,
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message).with_code(code)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Logs the cause and answers 500 with a message safe for clients.
    pub fn internal(failure: &'static str, err: impl std::fmt::Debug) -> Self {
        tracing::error!(error = ?err, failure, "request_failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
    }

    pub fn with_field(mut self, field: Option<&'static str>) -> Self {
        self.field = field;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_expired_at(mut self, at: DateTime<Utc>) -> Self {
        self.expired_at = Some(at);
        self
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }

    /// Maps a product use-case outcome; `failure` is the 500 message.
    pub fn product(err: ProductError, failure: &'static str) -> Self {
        match err {
            ProductError::NotFound => Self::not_found(err.to_string()),
            ProductError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ProductError::DiscountNotBelowPrice => {
                Self::bad_request(err.to_string()).with_field(Some("discountedPrice"))
            }
            ProductError::InvalidDescription(_)
            | ProductError::DuplicateSlugsInRequest
            | ProductError::SlugsExist(_)
            | ProductError::SlugTaken
            | ProductError::SlugClaimedConcurrently => Self::bad_request(err.to_string()),
            ProductError::Internal(e) => Self::internal(failure, e),
        }
    }

    pub fn auth(err: AuthError, failure: &'static str) -> Self {
        match err {
            AuthError::Internal(e) => Self::internal(failure, e),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        Self::bad_request(err.message).with_field(err.field)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: if self.status.is_server_error() {
                "error"
            } else {
                "fail"
            },
            message: &self.message,
            field: self.field,
            index: self.index,
            code: self.code,
            errors: self.errors.as_deref(),
            expired_at: self
                .expired_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// `Json` whose rejections use the error envelope.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(reason = %rejection.body_text(), "json_body_rejected");
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected request with `Content-Type: application/json`",
        ),
        _ => ApiError::bad_request("Invalid JSON payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_render_as_fail() {
        let (status, body) =
            body_of(FieldError::new("slug", "URL slug is required").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["field"], "slug");
        assert!(body.get("code").is_none());
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = ApiError::product(
            ProductError::Internal(anyhow::anyhow!("connection reset")),
            "Failed to fetch products",
        );
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Failed to fetch products");
    }

    #[tokio::test]
    async fn forbidden_names_the_action() {
        let (status, body) = body_of(ApiError::product(ProductError::Forbidden("delete"), "x")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "You don't have permission to delete this product");
    }

    #[test]
    fn retry_after_header_is_set() {
        let response = ApiError::new(StatusCode::TOO_MANY_REQUESTS, "slow down")
            .with_retry_after(42)
            .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
