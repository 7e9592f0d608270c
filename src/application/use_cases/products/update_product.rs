use uuid::Uuid;

use super::ProductError;
use crate::application::ports::errors::UniqueViolation;
use crate::application::ports::product_repository::ProductRepository;
use crate::application::services::rich_text::process_rich_text;
use crate::domain::products::product::{Product, ProductChanges, discount_is_valid};

pub struct UpdateProduct<'a, R: ProductRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProductRepository + ?Sized> UpdateProduct<'a, R> {
    pub async fn execute(
        &self,
        actor_id: Uuid,
        id: Uuid,
        mut changes: ProductChanges,
    ) -> Result<Product, ProductError> {
        if let Some(description) = changes.description.take() {
            changes.description = Some(process_rich_text(&description)?.content);
        }

        let current = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound)?;
        if !current.is_owned_by(actor_id) {
            return Err(ProductError::Forbidden("update"));
        }

        if let Some(slug) = changes.slug.as_deref() {
            if slug != current.slug && self.repo.slug_taken_by_other(slug, id).await? {
                return Err(ProductError::SlugTaken);
            }
        }

        let (price, discounted_price) = changes.effective_pricing(&current);
        if !discount_is_valid(price, discounted_price) {
            return Err(ProductError::DiscountNotBelowPrice);
        }

        match self.repo.update(id, &changes).await {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => Err(ProductError::NotFound),
            Err(err) if UniqueViolation::find(&err).is_some() => Err(ProductError::SlugTaken),
            Err(err) => Err(ProductError::Internal(err)),
        }
    }
}
