pub mod login;
pub mod me;
pub mod register;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists with this email.")]
    EmailExists,
    #[error("Email already registered.")]
    EmailRegistered,
    #[error("Username already taken.")]
    UsernameTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
