//! User credentials.
//!
//! A [`Credential`] is either [`Unhashed`] (just validated, still holding the
//! plaintext password) or [`Hashed`] (plaintext replaced by a
//! [`StoredHash`]). Only hashed credentials can be turned into a
//! [`CredentialRecord`] for storage, so the plaintext never reaches the
//! store.
//!
//! Timestamps come from a [`Clock`]; the `*_with_clock` variants take one
//! explicitly and the plain methods use [`SystemClock`].

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::password::{HashError, PasswordHasher};
use super::validation::{
    ChangePasswordPolicy, PasswordPolicy, ValidationError, normalize_email, normalize_name,
    validate_email, validate_name, validate_password,
};
use crate::clock::{Clock, SystemClock};
use crate::models::auth::StoredHash;

/// Errors from credential flows that involve both validation and hashing.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("Current password is incorrect")]
    IncorrectPassword,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Unhashed {}
    impl Sealed for super::Hashed {}
}

/// Marker for the password state of a [`Credential`].
pub trait CredentialState: sealed::Sealed {}

/// Freshly validated; holds the plaintext until hashed.
#[derive(Debug)]
pub struct Unhashed {
    password: SecretString,
}

/// Plaintext gone; only the bcrypt hash remains.
#[derive(Debug, Clone)]
pub struct Hashed {
    password_hash: StoredHash,
}

impl CredentialState for Unhashed {}
impl CredentialState for Hashed {}

/// Normalized email and display name plus the password in state `S`.
#[derive(Debug)]
pub struct Credential<S: CredentialState> {
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: S,
}

/// Shape handed to, and read back from, the external user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub email: String,
    pub name: String,
    pub password_hash: StoredHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<S: CredentialState> Credential<S> {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the display name. Leaves the credential untouched on failure.
    pub fn update_name(&mut self, name: &str) -> Result<(), ValidationError> {
        self.update_name_with_clock(name, &SystemClock)
    }

    pub fn update_name_with_clock(
        &mut self,
        name: &str,
        clock: &dyn Clock,
    ) -> Result<(), ValidationError> {
        validate_name(name)?;
        self.name = normalize_name(name);
        self.updated_at = clock.now();
        Ok(())
    }

    /// Replace the email. Leaves the credential untouched on failure.
    pub fn update_email(&mut self, email: &str) -> Result<(), ValidationError> {
        self.update_email_with_clock(email, &SystemClock)
    }

    pub fn update_email_with_clock(
        &mut self,
        email: &str,
        clock: &dyn Clock,
    ) -> Result<(), ValidationError> {
        validate_email(email)?;
        self.email = normalize_email(email);
        self.updated_at = clock.now();
        Ok(())
    }

    fn validate_profile(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_name(&self.name)
    }
}

impl Credential<Unhashed> {
    /// Validate signup input and build a credential.
    ///
    /// Rules run email, then name, then password; the first failure is
    /// returned and nothing is built.
    pub fn new(email: &str, name: &str, password: &str) -> Result<Self, ValidationError> {
        Self::new_with_clock(email, name, password, &SystemClock)
    }

    /// [`Credential::new`] stamped with `clock`.
    pub fn new_with_clock(
        email: &str,
        name: &str,
        password: &str,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        validate_email(email)?;
        validate_name(name)?;
        validate_password(password)?;

        let now = clock.now();
        Ok(Self {
            email: normalize_email(email),
            name: normalize_name(name),
            created_at: now,
            updated_at: now,
            state: Unhashed {
                password: SecretString::from(password.to_string()),
            },
        })
    }

    /// Re-run every signup rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_profile()?;
        validate_password(self.state.password.expose_secret())
    }

    /// Hash the plaintext and drop it.
    pub fn hash(self, hasher: &PasswordHasher) -> Result<Credential<Hashed>, HashError> {
        let password_hash = hasher.hash(self.state.password.expose_secret())?;
        Ok(Credential {
            email: self.email,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            state: Hashed { password_hash },
        })
    }
}

impl Credential<Hashed> {
    /// Rebuild a credential loaded from storage, re-checking its profile.
    pub fn from_record(record: CredentialRecord) -> Result<Self, ValidationError> {
        validate_email(&record.email)?;
        validate_name(&record.name)?;
        Ok(Self {
            email: normalize_email(&record.email),
            name: normalize_name(&record.name),
            created_at: record.created_at,
            updated_at: record.updated_at,
            state: Hashed {
                password_hash: record.password_hash,
            },
        })
    }

    /// Re-run the email and name rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_profile()
    }

    pub fn password_hash(&self) -> &StoredHash {
        &self.state.password_hash
    }

    /// Check a login attempt against the stored hash.
    pub fn verify_password(&self, candidate: &str, hasher: &PasswordHasher) -> bool {
        hasher.verify(candidate, &self.state.password_hash)
    }

    /// Change the password under [`ChangePasswordPolicy`].
    ///
    /// `current` must verify against the stored hash. On any failure the
    /// credential is left as it was.
    pub fn change_password(
        &mut self,
        current: &str,
        new_password: &str,
        hasher: &PasswordHasher,
    ) -> Result<(), CredentialError> {
        self.change_password_with_clock(current, new_password, hasher, &SystemClock)
    }

    pub fn change_password_with_clock(
        &mut self,
        current: &str,
        new_password: &str,
        hasher: &PasswordHasher,
        clock: &dyn Clock,
    ) -> Result<(), CredentialError> {
        if !self.verify_password(current, hasher) {
            return Err(CredentialError::IncorrectPassword);
        }
        ChangePasswordPolicy.check(new_password)?;
        let password_hash = hasher.hash(new_password)?;

        self.state.password_hash = password_hash;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Record for the external store.
    pub fn into_record(self) -> CredentialRecord {
        CredentialRecord {
            email: self.email,
            name: self.name,
            password_hash: self.state.password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
