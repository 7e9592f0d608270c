pub mod create_products;
pub mod delete_product;
pub mod get_product;
pub mod list_products;
pub mod update_product;

use crate::application::services::rich_text::InvalidRichText;

#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,
    #[error("You don't have permission to {0} this product")]
    Forbidden(&'static str),
    #[error(transparent)]
    InvalidDescription(#[from] InvalidRichText),
    #[error("Duplicate slugs found in request")]
    DuplicateSlugsInRequest,
    #[error("Product(s) with slug(s) already exist: {}", .0.join(", "))]
    SlugsExist(Vec<String>),
    #[error("A product with this slug already exists")]
    SlugTaken,
    /// A concurrent insert claimed a slug after the existence check.
    #[error("A product with this slug already exists.")]
    SlugClaimedConcurrently,
    #[error("Discounted price must be less than regular price")]
    DiscountNotBelowPrice,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
