//! Authentication domain models.
//!
//! These travel between the components and the external store or transport
//! layer; none of them carry plaintext passwords.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Salted bcrypt hash as produced by the password hasher.
///
/// The string embeds the algorithm version, cost and salt, so it is all the
/// store needs to keep.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredHash(String);

impl StoredHash {
    /// Wrap a hash loaded from storage.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for StoredHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to tell hashes apart in logs without dumping the digest.
        let prefix: String = self.0.chars().take(7).collect();
        write!(f, "StoredHash({prefix}…)")
    }
}

impl fmt::Display for StoredHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StoredHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

/// Identity and timing claims carried in an access token.
///
/// Timestamps are unix seconds. On the wire the fields are named
/// `user_id`, `email`, `iat`, `nbf` and `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, always positive.
    #[serde(rename = "user_id")]
    pub subject_id: i64,
    pub email: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "nbf")]
    pub not_before: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Lifecycle state of a token relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
}

impl Claims {
    /// True while `not_before <= now < expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.not_before <= now && now < self.expires_at
    }

    /// Token state at `now`. Anything outside the validity window counts as
    /// expired; there is no way back to [`TokenState::Valid`] once passed.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_active_at(now) {
            TokenState::Valid
        } else {
            TokenState::Expired
        }
    }

    /// Lifetime of the token in seconds, saturating at the `i64` bounds.
    pub fn ttl_secs(&self) -> i64 {
        self.expires_at.saturating_sub(self.issued_at)
    }

    pub fn issued_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.issued_at, 0)
    }

    pub fn expires_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}
