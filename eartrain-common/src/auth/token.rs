//! Session tokens
//!
//! HS256 JWTs carrying a snapshot of the user (id, email, name, subscription,
//! level, xp). Tokens live for seven days. There is no refresh or revocation:
//! a token stays valid until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{SubscriptionTier, User};

/// Token lifetime
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub subscription: SubscriptionTier,
    pub level: i64,
    pub xp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Token verification/issuance failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature valid but past its expiry
    #[error("token expired")]
    Expired,

    /// Malformed, tampered with, or signed with another key
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Token could not be produced
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies session tokens with one HMAC secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // keys deliberately omitted
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish()
    }
}

impl TokenService {
    /// Create a service with the default seven-day lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::days(TOKEN_TTL_DAYS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user` valid from now
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            subscription: user.subscription,
            level: user.level,
            xp: user.xp,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: "7f1c2b8e-0000-4000-8000-000000000001".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: None,
            google_id: None,
            name: "Ada".to_string(),
            subscription: SubscriptionTier::Premium,
            level: 3,
            xp: 600,
            avatar: None,
            created_at: now,
            updated_at: now,
            last_active: None,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new("test-secret");
        let token = service.issue(&user()).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user().id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.subscription, SubscriptionTier::Premium);
        assert_eq!(claims.level, 3);
        assert_eq!(claims.xp, 600);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let service = TokenService::new("test-secret");
        let issued = Utc::now() - Duration::days(TOKEN_TTL_DAYS + 1);
        let token = service.issue_at(&user(), issued).unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = TokenService::new("secret-a").issue(&user()).unwrap();
        let result = TokenService::new("secret-b").verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let service = TokenService::new("test-secret");
        assert!(matches!(service.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let service = TokenService::new("test-secret");
        let token = service.issue(&user()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        // flip one character of the payload segment
        let payload = &mut parts[1];
        let last = payload.pop().unwrap();
        payload.push(if last == 'A' { 'B' } else { 'A' });
        let tampered = parts.join(".");
        assert!(matches!(service.verify(&tampered), Err(TokenError::Invalid(_))));
    }
}
