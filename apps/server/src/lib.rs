//! Crate root: declares the module tree shared by the `trellis-server` binary
//! and its integration tests (`tests/`), and assembles the `axum::Router`
//! both sides need (`main.rs` to serve it, tests to drive it with
//! `tower::ServiceExt::oneshot`).

pub mod authz;
pub mod conditional;
pub mod config;
pub mod error;
pub mod identity;
pub mod ldp;
pub mod memento;
pub mod negotiation;
pub mod notifications;
pub mod observability;
pub mod prefer;
pub mod slug;
pub mod state;
pub mod webdav;

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::{Method, StatusCode};
use axum::routing::any;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_seconds);
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .fallback(any(ldp::dispatch))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_request_timeout))
                .timeout(timeout),
        )
        .with_state(state)
}

/// The outer request deadline (spec.md §5 "Timeouts (i)"); a request that
/// exceeds it is aborted and reported as `503` rather than hanging.
async fn handle_request_timeout(_err: tower::BoxError) -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}
