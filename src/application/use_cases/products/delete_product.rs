use uuid::Uuid;

use super::ProductError;
use crate::application::ports::product_repository::ProductRepository;

pub struct DeleteProduct<'a, R: ProductRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProductRepository + ?Sized> DeleteProduct<'a, R> {
    pub async fn execute(&self, actor_id: Uuid, id: Uuid) -> Result<(), ProductError> {
        let current = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound)?;
        if !current.is_owned_by(actor_id) {
            return Err(ProductError::Forbidden("delete"));
        }
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ProductError::NotFound)
        }
    }
}
