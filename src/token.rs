// 🔑 Token Issuer/Verifier
// Signed, time-limited bearer tokens (JWT, HS256) carrying a user identity
//
// The signing key is injected at construction so tests can swap it freely.
// Verification is a pure function of (token, key, clock): no shared state.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// CLAIMS
// ============================================================================

/// Session claim embedded in every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identity
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

// ============================================================================
// TOKEN ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

// ============================================================================
// TOKEN ISSUER
// ============================================================================

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from a signing key and a token lifetime.
    ///
    /// An empty key is treated as absent.
    pub fn new(signing_key: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if signing_key.trim().is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        // Expiry must stay representable for as long as the process runs
        if ttl <= Duration::zero() || Utc::now().checked_add_signed(ttl).is_none() {
            return Err(ConfigError::InvalidTtl(ttl.num_days()));
        }

        Ok(TokenIssuer {
            encoding: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding: DecodingKey::from_secret(signing_key.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity`, expiring `ttl` from now
    pub fn issue(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, identity: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: identity.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the identity claim
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::InvalidToken);
        }

        Ok(data.claims.sub)
    }
}

/// Short, non-reversible token fingerprint for log lines
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(key: &str) -> TokenIssuer {
        TokenIssuer::new(key, Duration::days(7)).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let tokens = issuer("signing-key");

        for identity in ["u1", "7f1c7d2e-1111-4a4a-9d9d-000000000000", "ünïcødé"] {
            let token = tokens.issue(identity).unwrap();
            assert_eq!(tokens.verify(&token).unwrap(), identity);
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = issuer("signing-key");
        let issued = Utc::now() - Duration::days(8);

        let token = tokens.issue_at("u1", issued).unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_from_other_key_rejected() {
        let ours = issuer("signing-key");
        let theirs = issuer("another-key");

        let token = theirs.issue("u1").unwrap();

        assert_eq!(ours.verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_tampered_and_garbage_tokens_rejected() {
        let tokens = issuer("signing-key");
        let token = tokens.issue("u1").unwrap();

        let mut tampered = token.clone();
        tampered.push('x');

        assert_eq!(tokens.verify(&tampered), Err(TokenError::InvalidToken));
        assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::InvalidToken));
        assert_eq!(tokens.verify(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_expiry_follows_ttl() {
        let tokens = TokenIssuer::new("signing-key", Duration::days(30)).unwrap();
        let now = Utc::now();
        let token = tokens.issue_at("u1", now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        let claims = decode::<Claims>(&token, &DecodingKey::from_secret(b"unused"), &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.exp - claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert_eq!(
            TokenIssuer::new("", Duration::days(7)).unwrap_err(),
            ConfigError::MissingSigningKey
        );
        assert_eq!(
            TokenIssuer::new("key", Duration::zero()).unwrap_err(),
            ConfigError::InvalidTtl(0)
        );
    }

    #[test]
    fn test_unrepresentable_ttl_rejected_at_construction() {
        assert_eq!(
            TokenIssuer::new("key", Duration::days(100_000_000)).unwrap_err(),
            ConfigError::InvalidTtl(100_000_000)
        );
    }

    #[test]
    fn test_expiry_overflow_is_an_error_not_a_panic() {
        let tokens = issuer("signing-key");

        let result = tokens.issue_at("u1", DateTime::<Utc>::MAX_UTC);

        assert!(matches!(result, Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 12);
    }
}
