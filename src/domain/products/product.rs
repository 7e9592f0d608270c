use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_PRICE: f64 = 1_000_000.0;
pub const MAX_GALLERY_IMAGES: usize = 10;

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub meta_title: String,
    pub product_name: String,
    pub slug: String,
    pub gallery_images: Vec<GalleryImage>,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub description: String,
    pub is_active: bool,
    pub created_by: ProductOwner,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Product {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by.id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductOwner {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

// Stored as JSONB, so the serde shape is the column format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default)]
    pub alt: String,
}

/// A validated, sanitized product waiting to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub meta_title: String,
    pub product_name: String,
    pub slug: String,
    pub gallery_images: Vec<GalleryImage>,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub meta_title: Option<String>,
    pub product_name: Option<String>,
    pub slug: Option<String>,
    pub gallery_images: Option<Vec<GalleryImage>>,
    pub price: Option<f64>,
    // None => not provided; Some(None) => clear; Some(Some(v)) => set
    pub discounted_price: Option<Option<f64>>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.meta_title.is_none()
            && self.product_name.is_none()
            && self.slug.is_none()
            && self.gallery_images.is_none()
            && self.price.is_none()
            && self.discounted_price.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
    }

    /// Price and discount the product would carry once these changes are applied.
    pub fn effective_pricing(&self, current: &Product) -> (f64, Option<f64>) {
        let price = self.price.unwrap_or(current.price);
        let discounted = match self.discounted_price {
            None => current.discounted_price,
            Some(v) => v,
        };
        (price, discounted)
    }
}

/// Prices are kept at cent precision.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn discount_is_valid(price: f64, discounted_price: Option<f64>) -> bool {
    discounted_price.is_none_or(|d| d >= 0.0 && d < price)
}
