use uuid::Uuid;

use super::ProductError;
use crate::application::ports::product_repository::ProductRepository;
use crate::domain::products::product::Product;

pub struct GetProduct<'a, R: ProductRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProductRepository + ?Sized> GetProduct<'a, R> {
    pub async fn execute(&self, id: Uuid) -> Result<Product, ProductError> {
        self.repo.get_by_id(id).await?.ok_or(ProductError::NotFound)
    }
}
