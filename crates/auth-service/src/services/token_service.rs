//! Stateless token issuance and the inbound token gate.
//!
//! Tokens are self-contained HS256 JWTs; validation requires no store
//! round-trip except the blacklist check, which only reads. Claims are
//! decoded once into a typed structure and validated field-by-field against
//! a single wall-clock reading.

use crate::cache::{self, AuthCache};
use crate::errors::AuthError;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{error, warn};

pub const BEARER_PREFIX: &str = "Bearer ";

/// JWT claims. Every field is optional at the decoding layer; which ones are
/// required is decided by the gate, field by field.
///
/// A token carrying neither `exp` nor `nbf` has no time constraint. That is
/// deliberate permissiveness in the gate - issuance always sets `exp`, so
/// every token this service mints does expire.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Custom Debug implementation that redacts the identity claim.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("username", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .finish()
    }
}

/// Mint a signed token asserting an authenticated identity, expiring after
/// `ttl`.
///
/// Signing failure (including an empty secret) is a hard internal error,
/// never retried.
pub fn issue_token(secret: &str, username: &str, ttl: Duration) -> Result<String, AuthError> {
    if secret.is_empty() {
        error!(target: "auth.token", "Refusing to sign token with empty secret");
        return Err(AuthError::Internal);
    }

    let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| AuthError::Internal)?;
    let claims = Claims {
        username: Some(username.to_string()),
        exp: Some(Utc::now().timestamp() + ttl_secs),
        nbf: None,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(
            target: "auth.token",
            error = %e,
            "Token signing failed"
        );
        AuthError::Internal
    })
}

/// The token gate. Validates an inbound `Authorization` value and returns
/// the asserted username.
///
/// Rejections are reason-coded (missing / malformed / signature / expired /
/// not-yet-valid / missing-claim / revoked) but never carry store-internal
/// detail. A blacklist read failure is treated as absence per the cache
/// contract; it is logged, not surfaced.
pub async fn authenticate(
    header: Option<&str>,
    secret: &str,
    cache: &dyn AuthCache,
) -> Result<String, AuthError> {
    let header = header
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("authorization header required".to_string()))?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AuthError::InvalidToken("invalid token format".to_string()))?;

    let claims = decode_claims(token, secret)?;

    // One clock reading covers both window checks
    let now = Utc::now().timestamp();
    validate_claims(&claims, now)?;

    let username = claims
        .username
        .ok_or_else(|| AuthError::InvalidToken("username claim required".to_string()))?;

    match cache.get(&cache::blacklist_key(token)).await {
        Ok(Some(_)) => {
            return Err(AuthError::InvalidToken("token revoked".to_string()));
        }
        Ok(None) => {}
        Err(e) => {
            warn!(
                target: "auth.token",
                error = %e,
                "Blacklist lookup failed, treating token as not revoked"
            );
        }
    }

    Ok(username)
}

/// Decode and signature-check a token. Expiry and not-before are NOT checked
/// here; the gate does that field-by-field.
fn decode_claims(token: &str, secret: &str) -> Result<Claims, AuthError> {
    // An empty secret rejects the token, it never bypasses verification
    if secret.is_empty() {
        return Err(AuthError::InvalidToken(
            "invalid token signature".to_string(),
        ));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => {
            AuthError::InvalidToken("invalid token signature".to_string())
        }
        _ => AuthError::InvalidToken("invalid token format".to_string()),
    })
}

fn validate_claims(claims: &Claims, now: i64) -> Result<(), AuthError> {
    if let Some(exp) = claims.exp {
        if now >= exp {
            return Err(AuthError::InvalidToken("token expired".to_string()));
        }
    }

    if let Some(nbf) = claims.nbf {
        if now < nbf {
            return Err(AuthError::InvalidToken("token not valid yet".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cache::mock::MockCache;

    const SECRET: &str = "test-secret";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    async fn gate(header: Option<&str>) -> Result<String, AuthError> {
        authenticate(header, SECRET, &MockCache::new()).await
    }

    fn rejection_reason(result: Result<String, AuthError>) -> String {
        match result {
            Err(AuthError::InvalidToken(reason)) => reason,
            other => panic!("expected InvalidToken rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issue_and_authenticate_round_trip() {
        let token = issue_token(SECRET, "alice", Duration::from_secs(3600)).unwrap();
        assert!(!token.is_empty());

        let username = gate(Some(&bearer(&token))).await.unwrap();
        assert_eq!(username, "alice");
    }

    #[test]
    fn test_issue_with_empty_secret_is_hard_error() {
        let result = issue_token("", "alice", Duration::from_secs(3600));
        assert!(matches!(result, Err(AuthError::Internal)));
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        assert_eq!(
            rejection_reason(gate(None).await),
            "authorization header required"
        );
        assert_eq!(
            rejection_reason(gate(Some("")).await),
            "authorization header required"
        );
    }

    #[tokio::test]
    async fn test_missing_bearer_prefix_rejected() {
        let token = issue_token(SECRET, "alice", Duration::from_secs(3600)).unwrap();
        assert_eq!(
            rejection_reason(gate(Some(&token)).await),
            "invalid token format"
        );
        assert_eq!(
            rejection_reason(gate(Some(&format!("Token {token}"))).await),
            "invalid token format"
        );
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        assert_eq!(
            rejection_reason(gate(Some("Bearer not.a.jwt")).await),
            "invalid token format"
        );
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected_as_signature_invalid() {
        let token = issue_token("other-secret", "alice", Duration::from_secs(3600)).unwrap();
        assert_eq!(
            rejection_reason(gate(Some(&bearer(&token))).await),
            "invalid token signature"
        );
    }

    #[tokio::test]
    async fn test_empty_secret_at_gate_is_rejection_not_bypass() {
        let token = issue_token(SECRET, "alice", Duration::from_secs(3600)).unwrap();
        let result = authenticate(Some(&bearer(&token)), "", &MockCache::new()).await;
        assert_eq!(rejection_reason(result), "invalid token signature");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let claims = Claims {
            username: Some("alice".to_string()),
            exp: Some(Utc::now().timestamp() - 10),
            nbf: None,
        };
        let token = sign(&claims, SECRET);
        assert_eq!(
            rejection_reason(gate(Some(&bearer(&token))).await),
            "token expired"
        );
    }

    #[tokio::test]
    async fn test_token_at_exact_expiry_rejected() {
        // now >= exp rejects, so a token whose exp is this instant is dead
        let claims = Claims {
            username: Some("alice".to_string()),
            exp: Some(Utc::now().timestamp()),
            nbf: None,
        };
        let token = sign(&claims, SECRET);
        assert_eq!(
            rejection_reason(gate(Some(&bearer(&token))).await),
            "token expired"
        );
    }

    #[tokio::test]
    async fn test_future_nbf_rejected_past_nbf_accepted() {
        let now = Utc::now().timestamp();

        let future = Claims {
            username: Some("alice".to_string()),
            exp: Some(now + 3600),
            nbf: Some(now + 300),
        };
        let token = sign(&future, SECRET);
        assert_eq!(
            rejection_reason(gate(Some(&bearer(&token))).await),
            "token not valid yet"
        );

        let past = Claims {
            username: Some("alice".to_string()),
            exp: Some(now + 3600),
            nbf: Some(now - 300),
        };
        let token = sign(&past, SECRET);
        assert_eq!(gate(Some(&bearer(&token))).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_token_without_time_claims_accepted() {
        // Documented permissiveness: absent exp/nbf fire no check
        let claims = Claims {
            username: Some("alice".to_string()),
            exp: None,
            nbf: None,
        };
        let token = sign(&claims, SECRET);
        assert_eq!(gate(Some(&bearer(&token))).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_missing_username_claim_rejected() {
        let claims = Claims {
            username: None,
            exp: Some(Utc::now().timestamp() + 3600),
            nbf: None,
        };
        let token = sign(&claims, SECRET);
        assert_eq!(
            rejection_reason(gate(Some(&bearer(&token))).await),
            "username claim required"
        );
    }

    #[tokio::test]
    async fn test_blacklisted_token_rejected() {
        let token = issue_token(SECRET, "alice", Duration::from_secs(3600)).unwrap();
        let cache = MockCache::new().with_entry(
            &cache::blacklist_key(&token),
            cache::BLACKLIST_SENTINEL,
            Duration::from_secs(3600),
        );

        let result = authenticate(Some(&bearer(&token)), SECRET, &cache).await;
        assert_eq!(rejection_reason(result), "token revoked");
    }

    #[tokio::test]
    async fn test_blacklist_read_failure_treated_as_absence() {
        let token = issue_token(SECRET, "alice", Duration::from_secs(3600)).unwrap();
        let cache = MockCache::new().failing_get();

        let username = authenticate(Some(&bearer(&token)), SECRET, &cache)
            .await
            .unwrap();
        assert_eq!(username, "alice");
    }

    #[test]
    fn test_claims_debug_redacts_username() {
        let claims = Claims {
            username: Some("alice".to_string()),
            exp: Some(0),
            nbf: None,
        };
        let debug = format!("{:?}", claims);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("alice"));
    }
}
