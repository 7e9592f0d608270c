use uuid::Uuid;

use super::ProductError;
use crate::application::ports::errors::UniqueViolation;
use crate::application::ports::product_repository::ProductRepository;
use crate::application::services::rich_text::process_rich_text;
use crate::domain::products::product::{NewProduct, Product};
use crate::domain::products::slug::first_duplicate;

pub struct CreateProducts<'a, R: ProductRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProductRepository + ?Sized> CreateProducts<'a, R> {
    /// Inserts every product or none of them. The owner always comes from
    /// the caller, never from the payload.
    pub async fn execute(
        &self,
        owner_id: Uuid,
        products: Vec<NewProduct>,
    ) -> Result<Vec<Product>, ProductError> {
        let products = products
            .into_iter()
            .map(|p| {
                let description = process_rich_text(&p.description)?.content;
                Ok(NewProduct { description, ..p })
            })
            .collect::<Result<Vec<_>, ProductError>>()?;

        if products.len() > 1
            && first_duplicate(products.iter().map(|p| p.slug.as_str())).is_some()
        {
            return Err(ProductError::DuplicateSlugsInRequest);
        }

        let slugs: Vec<String> = products.iter().map(|p| p.slug.clone()).collect();
        let existing = self.repo.existing_slugs(&slugs).await?;
        if !existing.is_empty() {
            return Err(ProductError::SlugsExist(existing));
        }

        match self.repo.insert_many(owner_id, &products).await {
            Ok(created) => {
                tracing::info!(owner_id = %owner_id, count = created.len(), "products_created");
                Ok(created)
            }
            Err(err) if UniqueViolation::find(&err).is_some() => {
                Err(ProductError::SlugClaimedConcurrently)
            }
            Err(err) => Err(ProductError::Internal(err)),
        }
    }
}
