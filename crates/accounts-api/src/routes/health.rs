//! Health check endpoint. Doubles as a readiness probe for the event store.

use accounts_core::repository::UniqueIndex;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Key used to probe a side table; never a valid email address.
const PROBE_KEY: &str = "health-probe@accounts.invalid";

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: &'static str,
    /// Whether the event store answered the probe.
    pub event_store: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = state
        .event_store
        .find_owner(UniqueIndex::CustomerEmailAddress, PROBE_KEY)
        .await;

    let (code, status, event_store) = match probe {
        Ok(_) => (StatusCode::OK, "ok", "reachable"),
        Err(err) => {
            warn!(error = %err, "event store probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            event_store,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accounts_core::repository::EventStore;
    use accounts_core::retry::DEFAULT_MAX_RETRIES;
    use accounts_identity::domain::password::PasswordHashingParams;
    use accounts_test_support::{FailingEventStore, FixedClock, InMemoryEventStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn probe(store: Arc<dyn EventStore>) -> (StatusCode, serde_json::Value) {
        let state = AppState::new(
            Arc::new(FixedClock::january_15th()),
            store,
            DEFAULT_MAX_RETRIES,
            PasswordHashingParams::default(),
        );
        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_reachable_store_reports_ok() {
        let (status, json) = probe(Arc::new(InMemoryEventStore::new())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["event_store"], "reachable");
    }

    #[tokio::test]
    async fn test_failing_store_reports_degraded_with_503() {
        let (status, json) = probe(Arc::new(FailingEventStore)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["event_store"], "unreachable");
    }
}
