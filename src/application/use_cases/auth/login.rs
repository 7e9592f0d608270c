use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use crate::application::ports::user_repository::UserRepository;
use crate::application::validation::users::Credentials;
use crate::domain::users::user::User;

pub struct Login<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> Login<'a, R> {
    /// `None` for an unknown email or a wrong password.
    pub async fn execute(&self, creds: &Credentials) -> anyhow::Result<Option<User>> {
        let row = match self.repo.find_by_email(&creds.email).await? {
            Some(r) => r,
            None => return Ok(None),
        };
        let Some(hash) = row.password_hash.as_deref() else {
            return Ok(None);
        };
        let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if Argon2::default()
            .verify_password(creds.password.as_bytes(), &parsed)
            .is_ok()
        {
            Ok(Some(row.user))
        } else {
            Ok(None)
        }
    }
}
