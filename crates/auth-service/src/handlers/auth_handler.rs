use crate::cache::{self, AuthCache};
use crate::config::Config;
use crate::errors::AuthError;
use crate::models::{AuthRequest, AuthUser, IdentityResponse, MessageResponse, TokenResponse};
use crate::repositories::users::UserStore;
use crate::services::credential_service::{self, CREDENTIAL_CACHE_TTL};
use crate::services::revocation_service;
use crate::services::token_service::{self, BEARER_PREFIX};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers.
///
/// The store and cache are injected as trait objects so tests substitute
/// in-memory doubles and multiple isolated instances can coexist.
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub cache: Arc<dyn AuthCache>,
    pub config: Config,
}

/// Handle login
///
/// POST /login
///
/// Verifies the credentials via the cache-aside path and issues a signed
/// token on success. Every resolution failure collapses to a generic 401.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(input) = payload.map_err(|_| AuthError::InvalidInput)?;

    credential_service::verify_credentials(
        state.store.as_ref(),
        state.cache.as_ref(),
        &input.username,
        &input.password,
    )
    .await?;

    let token = token_service::issue_token(
        &state.config.jwt_secret,
        &input.username,
        state.config.token_ttl(),
    )?;

    info!(
        target: "auth.handlers",
        username = %input.username,
        "Login succeeded"
    );

    Ok(Json(TokenResponse { token }))
}

/// Handle account registration
///
/// POST /register
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let Json(input) = payload.map_err(|_| AuthError::InvalidInput)?;

    let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!(
            target: "auth.handlers",
            error = %e,
            "Password hashing failed"
        );
        AuthError::Internal
    })?;

    let user = state.store.create(&input.username, &password_hash).await?;

    // Warm the credential cache so the first login skips the store.
    // Best-effort, same TTL as a login-path backfill.
    if let Err(e) = state
        .cache
        .set(
            &cache::credential_key(&user.username),
            &user.password_hash,
            CREDENTIAL_CACHE_TTL,
        )
        .await
    {
        warn!(
            target: "auth.handlers",
            error = %e,
            "Credential cache warm-up failed"
        );
    }

    info!(
        target: "auth.handlers",
        username = %user.username,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "user created".to_string(),
        }),
    ))
}

/// Handle account deletion
///
/// DELETE /unregister (behind the token gate)
///
/// Revokes the authenticated account and blacklists the token presented on
/// this request for the remainder of its possible lifetime.
pub async fn handle_unregister(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AuthError> {
    // The gate already validated this header; re-read it for the exact raw
    // token string to blacklist
    let raw_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| AuthError::InvalidToken("authorization header required".to_string()))?;

    revocation_service::revoke_account(
        state.store.as_ref(),
        state.cache.as_ref(),
        &username,
        raw_token,
        state.config.token_ttl(),
    )
    .await?;

    info!(
        target: "auth.handlers",
        username = %username,
        "User deleted"
    );

    Ok(Json(MessageResponse {
        message: "user deleted".to_string(),
    }))
}

/// Standalone gate endpoint for reverse-proxy forward-auth
///
/// GET /auth (behind the token gate)
pub async fn handle_whoami(
    Extension(AuthUser(username)): Extension<AuthUser>,
) -> Json<IdentityResponse> {
    Json(IdentityResponse { username })
}
