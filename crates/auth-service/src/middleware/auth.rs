use crate::errors::AuthError;
use crate::handlers::auth_handler::AppState;
use crate::models::AuthUser;
use crate::services::token_service;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

/// Token gate middleware.
///
/// Runs the gate over the `Authorization` header and, on success, attaches
/// the verified identity to the request extensions as [`AuthUser`] for
/// downstream handlers. Every rejection is terminal for the request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let username = token_service::authenticate(
        header_value.as_deref(),
        &state.config.jwt_secret,
        state.cache.as_ref(),
    )
    .await?;

    req.extensions_mut().insert(AuthUser(username));

    Ok(next.run(req).await)
}
