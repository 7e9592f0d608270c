use crate::application::ports::product_repository::ProductRepository;
use crate::domain::products::product::Product;

pub struct ListProducts<'a, R: ProductRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProductRepository + ?Sized> ListProducts<'a, R> {
    pub async fn execute(&self) -> anyhow::Result<Vec<Product>> {
        self.repo.list_all().await
    }
}
