// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The HTTP surface (spec §6): `axum` routes plus request tracing.

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use handlers::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/account", get(handlers::account))
        .route("/get", get(handlers::get_block))
        .route("/submit", post(handlers::submit))
        .route("/peg-in", post(handlers::peg_in))
        .route("/record-peg-in", post(handlers::record_peg_in))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
