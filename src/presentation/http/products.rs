use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, JsonBody};
use crate::application::use_cases::products::create_products::CreateProducts;
use crate::application::use_cases::products::delete_product::DeleteProduct;
use crate::application::use_cases::products::get_product::GetProduct;
use crate::application::use_cases::products::list_products::ListProducts;
use crate::application::use_cases::products::update_product::UpdateProduct;
use crate::application::validation::products::{CreateProductRequest, UpdateProductRequest};
use crate::bootstrap::app_context::AppContext;
use crate::domain::products::product::{GalleryImage, Product, ProductOwner};

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<ProductOwner> for OwnerResponse {
    fn from(o: ProductOwner) -> Self {
        Self {
            id: o.id,
            username: o.username,
            email: o.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub meta_title: String,
    pub product_name: String,
    pub slug: String,
    #[schema(value_type = Vec<Object>)]
    pub gallery_images: Vec<GalleryImage>,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub description: String,
    pub is_active: bool,
    pub created_by: OwnerResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            meta_title: p.meta_title,
            product_name: p.product_name,
            slug: p.slug,
            gallery_images: p.gallery_images,
            price: p.price,
            discounted_price: p.discounted_price,
            description: p.description,
            is_active: p.is_active,
            created_by: p.created_by.into(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub status: &'static str,
    pub results: usize,
    pub data: Vec<ProductResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductEnvelope {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<ProductResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsCreatedResponse {
    pub status: &'static str,
    pub message: String,
    /// An array for bulk bodies, a single product otherwise.
    #[schema(value_type = Object)]
    pub data: Value,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_products))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .with_state(ctx)
}

fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid product ID format"))
}

#[utoipa::path(get, path = "/api/v1/products", tag = "Products", responses((status = 200, body = ProductListResponse)))]
pub async fn list_products(
    State(ctx): State<AppContext>,
    _user: AuthUser,
) -> Result<Response, ApiError> {
    let repo = ctx.product_repo();
    let uc = ListProducts {
        repo: repo.as_ref(),
    };
    let products = uc
        .execute()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch products", e))?;
    let data: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok((
        headers,
        Json(ProductListResponse {
            status: "success",
            results: data.len(),
            data,
        }),
    )
        .into_response())
}

#[utoipa::path(get, path = "/api/v1/products/{id}", tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, body = ProductEnvelope), (status = 404, description = "Product not found")))]
pub async fn get_product(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let id = parse_product_id(&id)?;
    let repo = ctx.product_repo();
    let uc = GetProduct {
        repo: repo.as_ref(),
    };
    let product = uc
        .execute(id)
        .await
        .map_err(|e| ApiError::product(e, "Failed to fetch product"))?;
    Ok(Json(ProductEnvelope {
        status: "success",
        message: None,
        data: Some(product.into()),
    }))
}

#[utoipa::path(post, path = "/api/v1/products", tag = "Products", request_body = CreateProductRequest,
    responses((status = 201, body = ProductsCreatedResponse), (status = 400, description = "Validation or slug conflict")))]
pub async fn create_products(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<ProductsCreatedResponse>), ApiError> {
    let (items, bulk) = match body {
        Value::Array(items) if items.is_empty() => {
            return Err(ApiError::bad_request(
                "Request body must contain at least one product",
            ));
        }
        Value::Array(items) => (items, true),
        other @ Value::Object(_) => (vec![other], false),
        _ => {
            return Err(ApiError::bad_request(
                "Request body must be a product object or an array of products",
            ));
        }
    };

    let mut products = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let parsed = match item {
            item @ Value::Object(_) => serde_json::from_value::<CreateProductRequest>(item)
                .map_err(|e| ApiError::bad_request(format!("Invalid product data: {e}"))),
            _ => Err(ApiError::bad_request("Each product must be a JSON object")),
        }
        .and_then(|req| req.into_new_product().map_err(ApiError::from));
        match parsed {
            Ok(product) => products.push(product),
            Err(err) if bulk => return Err(err.with_index(index)),
            Err(err) => return Err(err),
        }
    }

    let repo = ctx.product_repo();
    let uc = CreateProducts {
        repo: repo.as_ref(),
    };
    let created = uc
        .execute(user.id, products)
        .await
        .map_err(|e| ApiError::product(e, "Failed to create product(s)"))?;

    let message = format!("{} product(s) created successfully", created.len());
    let mut data: Vec<ProductResponse> = created.into_iter().map(Into::into).collect();
    let data = if bulk {
        serde_json::to_value(&data)
    } else {
        serde_json::to_value(data.pop())
    }
    .map_err(|e| ApiError::internal("Failed to create product(s)", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ProductsCreatedResponse {
            status: "success",
            message,
            data,
        }),
    ))
}

#[utoipa::path(patch, path = "/api/v1/products/{id}", tag = "Products", request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, body = ProductEnvelope), (status = 403, description = "Not the owner"), (status = 404, description = "Product not found")))]
pub async fn update_product(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateProductRequest>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let id = parse_product_id(&id)?;
    let changes = req.into_changes()?;
    let repo = ctx.product_repo();
    let uc = UpdateProduct {
        repo: repo.as_ref(),
    };
    let updated = uc
        .execute(user.id, id, changes)
        .await
        .map_err(|e| ApiError::product(e, "Failed to update product"))?;
    tracing::info!(product_id = %id, user_id = %user.id, "product_updated");
    Ok(Json(ProductEnvelope {
        status: "success",
        message: Some("Product updated successfully".into()),
        data: Some(updated.into()),
    }))
}

#[utoipa::path(delete, path = "/api/v1/products/{id}", tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, body = ProductEnvelope), (status = 403, description = "Not the owner"), (status = 404, description = "Product not found")))]
pub async fn delete_product(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let id = parse_product_id(&id)?;
    let repo = ctx.product_repo();
    let uc = DeleteProduct {
        repo: repo.as_ref(),
    };
    uc.execute(user.id, id)
        .await
        .map_err(|e| ApiError::product(e, "Failed to delete product"))?;
    tracing::info!(product_id = %id, user_id = %user.id, "product_deleted");
    Ok(Json(ProductEnvelope {
        status: "success",
        message: Some("Product deleted successfully".into()),
        data: None,
    }))
}
