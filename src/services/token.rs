use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Which half of the token pair a JWT represents. Serialized into the
/// `type` claim so each endpoint can insist on the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user ID, stringified.
    pub sub: String,
    /// Unique token ID, the unit of revocation.
    pub jti: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Time left until this token expires, clamped at zero. Used to bound
    /// how long a revoked token ID has to be remembered.
    #[must_use]
    pub fn remaining_ttl(&self) -> std::time::Duration {
        let secs = self.exp - Utc::now().timestamp();
        std::time::Duration::from_secs(secs.max(0).unsigned_abs())
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    /// Sign a token of the given kind for a user, with a fresh `jti`.
    pub fn issue(&self, user_id: i32, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue the access + refresh pair handed out at login.
    pub fn issue_pair(&self, user_id: i32) -> Result<(String, String), TokenError> {
        Ok((
            self.issue(user_id, TokenKind::Access)?,
            self.issue(user_id, TokenKind::Refresh)?,
        ))
    }

    /// Verify signature and expiry, and return the claims. Expiry is the
    /// only failure callers are told apart from the rest; everything else
    /// collapses into `Invalid`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 900, 3600)
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let svc = service();
        let token = svc.issue(42, TokenKind::Access).unwrap();

        let claims = svc.decode(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(!claims.jti.is_empty());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_kind_serializes_into_type_claim() {
        let claims = Claims {
            sub: "1".to_string(),
            jti: "abc".to_string(),
            kind: TokenKind::Refresh,
            iat: 0,
            exp: 0,
        };

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "refresh");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_pair_has_distinct_token_ids() {
        let svc = service();
        let (access, refresh) = svc.issue_pair(7).unwrap();

        let access_claims = svc.decode(&access).unwrap();
        let refresh_claims = svc.decode(&refresh).unwrap();
        assert_eq!(access_claims.kind, TokenKind::Access);
        assert_eq!(refresh_claims.kind, TokenKind::Refresh);
        assert_ne!(access_claims.jti, refresh_claims.jti);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let svc = TokenService::new("test-secret", -10, -10);
        let token = svc.issue(1, TokenKind::Access).unwrap();

        assert_eq!(svc.decode(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let svc = service();
        let mut token = svc.issue(1, TokenKind::Access).unwrap();
        token.push('A');

        assert_eq!(svc.decode(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let other = TokenService::new("other-secret", 900, 3600);
        let token = other.issue(1, TokenKind::Access).unwrap();

        assert_eq!(service().decode(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert_eq!(
            service().decode("not-a-jwt").unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_remaining_ttl_clamps_at_zero() {
        let claims = Claims {
            sub: "1".to_string(),
            jti: "abc".to_string(),
            kind: TokenKind::Access,
            iat: 0,
            exp: 0,
        };

        assert_eq!(claims.remaining_ttl(), std::time::Duration::ZERO);
    }
}
