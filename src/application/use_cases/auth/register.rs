use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use password_hash::rand_core::OsRng;

use super::AuthError;
use crate::application::ports::errors::UniqueViolation;
use crate::application::ports::user_repository::UserRepository;
use crate::application::validation::users::NewAccount;
use crate::domain::users::user::User;

pub struct Register<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> Register<'a, R> {
    pub async fn execute(&self, account: &NewAccount) -> Result<User, AuthError> {
        if self.repo.find_by_email(&account.email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(account.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .to_string();
        match self
            .repo
            .create_user(&account.username, &account.email, &hash)
            .await
        {
            Ok(user) => Ok(user),
            Err(err) => match UniqueViolation::find(&err) {
                Some(v) if v.constraint.contains("username") => Err(AuthError::UsernameTaken),
                Some(_) => Err(AuthError::EmailRegistered),
                None => Err(AuthError::Internal(err)),
            },
        }
    }
}
