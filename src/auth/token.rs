use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token generation failed: {0}")]
    Generation(String),

    #[error("token expired")]
    Expired,

    #[error("token rejected: unexpected signing algorithm")]
    WrongAlgorithm,

    #[error("token rejected: {0}")]
    Invalid(String),
}

/// A freshly minted token with its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates HS256 bearer tokens. Immutable once built.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    leeway_secs: u64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration, leeway_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            leeway_secs,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::hours(config.jwt_expiry_hours),
            config.jwt_leeway_secs,
        )
    }

    pub fn issue(&self, user_id: Uuid, email: &str, role: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, email, role, Utc::now().timestamp())
    }

    /// Mint with a fixed `iat`; equal inputs give byte-identical tokens.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        issued_at: i64,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| TokenError::Generation(format!("expiry out of range: {}", claims.exp)))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate signature and algorithm, then expiry against `now`.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        let claims = data.claims;
        if now >= claims.exp.saturating_add(self.leeway_secs as i64) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(24), 0)
    }

    #[test]
    fn claims_round_trip_within_lifetime() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let issued_at = 1_700_000_000;
        let issued = tokens.issue_at(user_id, "ali@x.io", "employee", issued_at).unwrap();

        let expected = Claims {
            user_id,
            email: "ali@x.io".into(),
            role: "employee".into(),
            iat: issued_at,
            exp: issued_at + 24 * 3600,
        };
        for now in [issued_at, issued_at + 1, issued_at + 24 * 3600 - 1] {
            assert_eq!(tokens.validate_at(&issued.token, now).unwrap(), expected);
        }
        assert_eq!(issued.expires_at.timestamp(), expected.exp);
    }

    #[test]
    fn expires_exactly_at_exp() {
        let tokens = service();
        let issued_at = 1_700_000_000;
        let issued = tokens.issue_at(Uuid::new_v4(), "a@b.io", "employee", issued_at).unwrap();
        let exp = issued_at + 24 * 3600;
        assert!(matches!(tokens.validate_at(&issued.token, exp), Err(TokenError::Expired)));
        assert!(matches!(tokens.validate_at(&issued.token, exp + 3600), Err(TokenError::Expired)));
    }

    #[test]
    fn fixed_iat_mints_identical_tokens() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let first = tokens.issue_at(user_id, "a@b.io", "admin", 1_700_000_000).unwrap();
        let claims = tokens.validate_at(&first.token, 1_700_000_001).unwrap();
        let second = tokens
            .issue_at(claims.user_id, &claims.email, &claims.role, claims.iat)
            .unwrap();
        assert_eq!(first.token, second.token);
    }

    #[test]
    fn rejects_other_secret() {
        let issued = service().issue(Uuid::new_v4(), "a@b.io", "employee").unwrap();
        let other = TokenService::new("another-secret", Duration::hours(24), 0);
        assert!(matches!(other.validate(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn rejects_other_algorithms() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "a@b.io".into(),
            role: "employee".into(),
            iat: now,
            exp: now + 3600,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(service().validate(&hs512), Err(TokenError::WrongAlgorithm)));
    }

    #[test]
    fn rejects_unsigned_and_garbage_tokens() {
        let tokens = service();
        // {"alg":"none","typ":"JWT"}.{"user_id":...}.
        let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJ1c2VyX2lkIjoiMDAwMDAwMDAtMDAwMC0wMDAwLTAwMDAtMDAwMDAwMDAwMDAwIiwiZW1haWwiOiJhQGIuaW8iLCJyb2xlIjoiYWRtaW4iLCJpYXQiOjAsImV4cCI6OTk5OTk5OTk5OX0.";
        assert!(tokens.validate(unsigned).is_err());
        assert!(tokens.validate("not.a.real.token").is_err());
        assert!(tokens.validate("").is_err());
    }
}
