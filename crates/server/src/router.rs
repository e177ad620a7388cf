//! HTTP router construction.
//!
//! Everything except `/health` sits behind the Basic auth middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::require_basic_auth;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let protected = Router::new()
        .route(
            "/ipfs",
            post(api::upload_cids).layer(DefaultBodyLimit::max(state.upload_max_bytes)),
        )
        .route("/tokens", get(api::tokens_list))
        .route("/tokens/{cid}", get(api::token_get))
        .route("/batches", get(api::batches_list))
        .route("/batches/{id}", get(api::batch_get))
        .route("/metrics", get(api::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/health", get(api::health))
        .merge(protected)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
