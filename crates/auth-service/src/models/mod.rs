use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Account model (maps to users table).
///
/// The password hash is the only credential material the service ever
/// persists; plaintext passwords exist only transiently in request bodies.
#[derive(Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Custom Debug implementation that redacts the password hash so it never
/// lands in logs or panic output.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Login and registration request body.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Plain confirmation body for register/unregister.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of the standalone gate endpoint, for forward-auth consumers.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub username: String,
}

/// Identity attached to a request after it passes the token gate.
///
/// An explicit typed value threaded through request extensions rather than a
/// loosely typed per-request bag; handlers extract it with
/// `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_debug_redacts_hash() {
        let user = User {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            created_at: Utc::now(),
        };

        let debug = format!("{:?}", user);
        assert!(debug.contains("alice"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("$2b$12$"));
    }

    #[test]
    fn test_auth_request_deserialization() {
        let body = r#"{"username":"alice","password":"s3cret"}"#;
        let req: AuthRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.password, "s3cret");
    }

    #[test]
    fn test_token_response_shape() {
        let json = serde_json::to_string(&TokenResponse {
            token: "abc.def.ghi".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"token":"abc.def.ghi"}"#);
    }
}
