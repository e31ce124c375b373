//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The control-plane surface is deliberately tiny: a home-automation switch
//! flips `/api/active`, and `/api/brightness` fades the device output level.
//! Handlers only touch `AppState`; device I/O happens on the driver's tick.

pub mod control;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the control-plane router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/active", get(control::get_active).post(control::set_active))
        .route("/api/brightness", get(control::get_brightness).post(control::set_brightness))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
