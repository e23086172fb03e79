use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(handler::health_handler).fallback(handler::not_found_handler),
        )
        .route("/:namespace/:action", any(handler::code_handler))
        .fallback(handler::not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
