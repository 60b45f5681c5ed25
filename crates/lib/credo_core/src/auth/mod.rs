//! Authentication core.
//!
//! Provides credential validation, password hashing and signed access tokens
//! that can be shared by any transport or storage layer.
//!
//! Each component returns its own error type so callers can match on the
//! exact failure. [`AuthError`] unifies them for callers that only need to
//! propagate.

pub mod credential;
pub mod jwt;
pub mod password;
pub mod validation;

use thiserror::Error;

pub use credential::{Credential, CredentialError, CredentialRecord, Hashed, Unhashed};
pub use jwt::{TokenError, TokenService};
pub use password::{HashError, PasswordHasher};
pub use validation::ValidationError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Invalid credentials")]
    CredentialError,
}

impl From<CredentialError> for AuthError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Validation(e) => AuthError::Validation(e),
            CredentialError::Hash(e) => AuthError::Hash(e),
            CredentialError::IncorrectPassword => AuthError::CredentialError,
        }
    }
}
