use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::products::product::{NewProduct, Product, ProductChanges};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, newest first, with their owner populated.
    async fn list_all(&self) -> anyhow::Result<Vec<Product>>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>>;

    /// Which of `slugs` are already stored.
    async fn existing_slugs(&self, slugs: &[String]) -> anyhow::Result<Vec<String>>;

    async fn slug_taken_by_other(&self, slug: &str, exclude_id: Uuid) -> anyhow::Result<bool>;

    // All or nothing; fails with `UniqueViolation` on a slug race.
    async fn insert_many(
        &self,
        owner_id: Uuid,
        products: &[NewProduct],
    ) -> anyhow::Result<Vec<Product>>;

    async fn update(&self, id: Uuid, changes: &ProductChanges) -> anyhow::Result<Option<Product>>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
