//! Accounts API — axum HTTP adapter over the customer and identity handlers.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the full router. `main.rs` adds the HTTP layers on top.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/customers", routes::customers::router())
        .nest("/api/v1/identities", routes::identities::router())
        .with_state(state)
}
