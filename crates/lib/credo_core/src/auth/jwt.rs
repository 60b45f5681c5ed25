//! JWT access token issuance and validation.
//!
//! Tokens are signed with HS256 over a single process-wide secret. On
//! validation only the HMAC family is accepted: the declared `alg` is read
//! first and anything else (`none`, RSA, EC, EdDSA) is refused before the
//! signature is looked at. The decoding key is always the HMAC secret.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::models::auth::Claims;

/// Access token lifetime: 24 hours.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Algorithms accepted on validation.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Token issuance and validation errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Secret key cannot be empty")]
    EmptyKey,

    #[error("Subject id must be positive")]
    InvalidSubject,

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Token is empty")]
    EmptyToken,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token is expired or not yet valid")]
    Expired,

    #[error("Invalid token claims")]
    InvalidClaims,

    #[error("Token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Only the `alg` field of the header is inspected before verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Issues and validates signed access tokens.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Token service on the system clock.
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Token service reading time from `clock`.
    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptyKey);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // Time checks run against `clock` below, without leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    /// Issue a signed token for `subject_id`, valid for 24 hours from now.
    pub fn issue(&self, subject_id: i64, email: &str) -> Result<String, TokenError> {
        if subject_id <= 0 {
            return Err(TokenError::InvalidSubject);
        }
        if email.is_empty() {
            return Err(TokenError::EmptyEmail);
        }

        let now = self.clock.now().timestamp();
        let claims = Claims {
            subject_id,
            email: email.to_string(),
            issued_at: now,
            not_before: now,
            expires_at: now + Duration::hours(TOKEN_TTL_HOURS).num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Validate a token and return its claims.
    ///
    /// Checks, in order: empty input, declared algorithm, signature and
    /// structure, claim sanity, then the validity window.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }

        let alg = declared_algorithm(token)?;
        if !is_hmac(&alg) {
            return Err(TokenError::UnsupportedAlgorithm(alg));
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidSignature)?
            .claims;

        if claims.subject_id <= 0
            || claims.email.is_empty()
            || claims.not_before > claims.issued_at
        {
            return Err(TokenError::InvalidClaims);
        }

        if !claims.is_active_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Read the `alg` the token claims for itself. Any failure to read it is
/// reported as a malformed token.
fn declared_algorithm(token: &str) -> Result<String, TokenError> {
    let header_segment = token.split_once('.').map_or(token, |(header, _)| header);
    let bytes = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|_| TokenError::InvalidSignature)?;
    let header: RawHeader =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::InvalidSignature)?;
    Ok(header.alg)
}

fn is_hmac(alg: &str) -> bool {
    matches!(alg, "HS256" | "HS384" | "HS512")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    const SECRET: &str = "test-secret-key-12345";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn service_at(at: DateTime<Utc>) -> TokenService {
        TokenService::with_clock(SECRET, Arc::new(FixedClock(at))).unwrap()
    }

    fn b64(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn payload_for(at: DateTime<Utc>) -> serde_json::Value {
        let now = at.timestamp();
        json!({
            "user_id": 42,
            "email": "a@b.com",
            "iat": now,
            "nbf": now,
            "exp": now + 86_400,
        })
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(TokenService::new(""), Err(TokenError::EmptyKey)));
    }

    #[test]
    fn debug_does_not_expose_key() {
        let service = TokenService::new(SECRET).unwrap();
        assert!(!format!("{service:?}").contains(SECRET));
    }

    #[test]
    fn issue_then_validate() {
        let service = service_at(start());
        let token = service.issue(42, "a@b.com").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.subject_id, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.issued_at, start().timestamp());
        assert_eq!(claims.not_before, claims.issued_at);
        assert_eq!(claims.expires_at - claims.issued_at, 24 * 3600);
    }

    #[test]
    fn issued_header_is_hs256_jwt() {
        let token = service_at(start()).issue(1, "a@b.com").unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn issue_rejects_bad_subject_and_email() {
        let service = service_at(start());
        assert!(matches!(
            service.issue(0, "a@b.com"),
            Err(TokenError::InvalidSubject)
        ));
        assert!(matches!(
            service.issue(-1, "a@b.com"),
            Err(TokenError::InvalidSubject)
        ));
        assert!(matches!(service.issue(1, ""), Err(TokenError::EmptyEmail)));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            service_at(start()).validate(""),
            Err(TokenError::EmptyToken)
        ));
    }

    #[test]
    fn flipping_any_signature_character_invalidates() {
        let service = service_at(start());
        let token = service.issue(42, "a@b.com").unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                matches!(service.validate(&tampered), Err(TokenError::InvalidSignature)),
                "position {i}"
            );
        }
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let service = service_at(start());
        let token = service.issue(42, "a@b.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut payload = payload_for(start());
        payload["user_id"] = json!(1);
        let forged = format!("{}.{}.{}", parts[0], b64(&payload), parts[2]);

        assert!(matches!(
            service.validate(&forged),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenService::with_clock("another-secret", Arc::new(FixedClock(start())))
            .unwrap();
        let token = other.issue(42, "a@b.com").unwrap();
        assert!(matches!(
            service_at(start()).validate(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_tokens_are_invalid_signature() {
        let service = service_at(start());
        let token = service.issue(42, "a@b.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        for bad in [
            "not-a-token".to_string(),
            "a.b.c".to_string(),
            format!("{}.{}", parts[0], parts[1]),
            format!("{token}.extra"),
            format!("{}.!!!.{}", parts[0], parts[2]),
        ] {
            assert!(
                matches!(service.validate(&bad), Err(TokenError::InvalidSignature)),
                "{bad}"
            );
        }
    }

    #[test]
    fn unparseable_claims_are_invalid_signature() {
        let service = service_at(start());
        let payload = json!({"sub": "42"});
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            service.validate(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn none_algorithm_is_unsupported() {
        let service = service_at(start());
        let header = b64(&json!({"alg": "none", "typ": "JWT"}));
        let payload = b64(&payload_for(start()));

        for token in [
            format!("{header}.{payload}."),
            format!("{header}.{payload}"),
        ] {
            match service.validate(&token) {
                Err(TokenError::UnsupportedAlgorithm(alg)) => assert_eq!(alg, "none"),
                other => panic!("expected UnsupportedAlgorithm, got {other:?}"),
            }
        }
    }

    #[test]
    fn asymmetric_algorithms_are_unsupported() {
        let service = service_at(start());
        let payload = b64(&payload_for(start()));

        for alg in ["RS256", "ES256", "PS256", "EdDSA", "hs256"] {
            let header = b64(&json!({"alg": alg, "typ": "JWT"}));
            let token = format!("{header}.{payload}.c2lnbmF0dXJl");
            assert!(
                matches!(
                    service.validate(&token),
                    Err(TokenError::UnsupportedAlgorithm(ref a)) if a == alg
                ),
                "{alg}"
            );
        }
    }

    #[test]
    fn relabelled_hmac_token_is_unsupported() {
        // A valid HS256 token whose header now claims RS256.
        let service = service_at(start());
        let token = service.issue(42, "a@b.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let header = b64(&json!({"alg": "RS256", "typ": "JWT"}));
        let relabelled = format!("{header}.{}.{}", parts[1], parts[2]);

        assert!(matches!(
            service.validate(&relabelled),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn other_hmac_variants_are_accepted() {
        let service = service_at(start());
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = encode(
                &Header::new(alg),
                &payload_for(start()),
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap();
            let claims = service.validate(&token).unwrap();
            assert_eq!(claims.subject_id, 42);
        }
    }

    #[test]
    fn expires_after_ttl() {
        let token = service_at(start()).issue(42, "a@b.com").unwrap();

        let almost = start() + Duration::hours(TOKEN_TTL_HOURS) - Duration::seconds(1);
        assert!(service_at(almost).validate(&token).is_ok());

        let at_expiry = start() + Duration::hours(TOKEN_TTL_HOURS);
        assert!(matches!(
            service_at(at_expiry).validate(&token),
            Err(TokenError::Expired)
        ));

        let later = start() + Duration::days(30);
        assert!(matches!(
            service_at(later).validate(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn not_yet_valid_is_expired() {
        let token = service_at(start()).issue(42, "a@b.com").unwrap();
        let earlier = start() - Duration::seconds(1);
        assert!(matches!(
            service_at(earlier).validate(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn past_expiry_in_signed_payload_is_expired() {
        let service = service_at(start());
        let mut payload = payload_for(start() - Duration::days(2));
        payload["exp"] = json!(start().timestamp() - 60);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(service.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn signed_but_nonsensical_claims_are_rejected() {
        let service = service_at(start());
        let sign = |payload: &serde_json::Value| {
            encode(
                &Header::new(Algorithm::HS256),
                payload,
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap()
        };

        let mut zero_subject = payload_for(start());
        zero_subject["user_id"] = json!(0);
        let mut empty_email = payload_for(start());
        empty_email["email"] = json!("");
        let mut late_nbf = payload_for(start());
        late_nbf["nbf"] = json!(start().timestamp() + 10);

        for payload in [zero_subject, empty_email, late_nbf] {
            assert!(
                matches!(service.validate(&sign(&payload)), Err(TokenError::InvalidClaims)),
                "{payload}"
            );
        }
    }

    #[test]
    fn expired_takes_precedence_only_after_signature() {
        let token = service_at(start()).issue(42, "a@b.com").unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let later = start() + Duration::days(2);
        assert!(matches!(
            service_at(later).validate(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn service_is_shareable_across_threads() {
        let service = Arc::new(service_at(start()));
        let handles: Vec<_> = (1..=8)
            .map(|id| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    let token = service.issue(id, "a@b.com").unwrap();
                    service.validate(&token).unwrap().subject_id
                })
            })
            .collect();
        let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}
