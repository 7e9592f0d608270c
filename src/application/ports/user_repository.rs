use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::users::user::User;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub password_hash: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    // Fails with `UniqueViolation` when the email or username is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}
