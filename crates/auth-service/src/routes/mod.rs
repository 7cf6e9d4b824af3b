use crate::handlers::auth_handler::{self, AppState};
use crate::middleware;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_routes(state: Arc<AppState>) -> Router {
    // Routes behind the token gate
    let protected = Router::new()
        .route("/unregister", delete(auth_handler::handle_unregister))
        .route("/auth", get(auth_handler::handle_whoami))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .route("/login", post(auth_handler::handle_login))
        .route("/register", post(auth_handler::handle_register))
        .merge(protected)
        // Health check
        .route("/health", get(health_check))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
