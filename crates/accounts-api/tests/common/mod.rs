//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use accounts_core::repository::EventStore;
use accounts_core::retry::DEFAULT_MAX_RETRIES;
use accounts_customer::application::serialization::from_stored_event;
use accounts_customer::domain::events::CustomerEventKind;
use accounts_customer::domain::values::CustomerId;
use accounts_event_store::pg_event_store::PgEventStore;
use accounts_identity::domain::password::PasswordHashingParams;
use accounts_test_support::FixedClock;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use accounts_api::state::AppState;

/// Build the full app router with a real `PgEventStore`, a fixed clock and
/// cheap Argon2 parameters. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let app_state = AppState::new(
        Arc::new(FixedClock::january_15th()),
        Arc::new(PgEventStore::new(pool)),
        DEFAULT_MAX_RETRIES,
        PasswordHashingParams::build(1024, 1, 1).unwrap(),
    );
    accounts_api::app(app_state)
}

/// Send a request and return the status plus the JSON body, or
/// `Value::Null` for an empty body.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

/// Send a PUT request with a JSON body and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

/// Send a DELETE request and return the status.
pub async fn delete(app: Router, uri: &str) -> StatusCode {
    send(app, "DELETE", uri, None).await.0
}

/// Reads the confirmation hash the customer was registered with.
pub async fn registration_confirmation_hash(pool: PgPool, customer_id: &str) -> String {
    let store = PgEventStore::new(pool);
    let stream_id = CustomerId::build(customer_id).unwrap().stream_id();
    let stored = store.retrieve(&stream_id, 1, 1).await.unwrap();
    match from_stored_event(&stored[0]).unwrap().kind {
        CustomerEventKind::CustomerRegistered(payload) => {
            payload.confirmation_hash.as_str().to_owned()
        }
        other => panic!("expected CustomerRegistered, got {other:?}"),
    }
}
