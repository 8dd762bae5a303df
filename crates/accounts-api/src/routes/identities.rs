//! Routes for the Identity bounded context.

use accounts_identity::application::command_handlers;
use accounts_identity::application::query_handlers;
use accounts_identity::domain::commands::{DeleteIdentity, RegisterIdentity, VerifyCredentials};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body carrying an email address and a plain password. Used for
/// registration and for credential verification.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email_address: String,
    pub password: String,
}

/// Response body naming an identity.
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub identity_id: String,
}

/// POST /api/v1/identities
#[instrument(skip(state, request))]
async fn register_identity(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let command = RegisterIdentity::build(&request.email_address, &request.password)?;
    let identity_id = command_handlers::handle_register_identity(
        &command,
        state.password_hashing,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(IdentityResponse {
            identity_id: identity_id.to_string(),
        }),
    ))
}

/// DELETE /api/v1/identities/{identity_id}
#[instrument(skip(state))]
async fn delete_identity(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let command = DeleteIdentity::build(&identity_id)?;
    command_handlers::handle_delete_identity(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/identities/verify
#[instrument(skip(state, request))]
async fn verify_credentials(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let query = VerifyCredentials::build(&request.email_address, &request.password)?;
    let identity_id = query_handlers::verify_credentials(&query, state.event_store.as_ref()).await?;
    Ok(Json(IdentityResponse {
        identity_id: identity_id.to_string(),
    }))
}

/// Returns the router for the identity context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_identity))
        .route("/verify", post(verify_credentials))
        .route("/{identity_id}", delete(delete_identity))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accounts_core::retry::DEFAULT_MAX_RETRIES;
    use accounts_identity::domain::password::PasswordHashingParams;
    use accounts_test_support::{FixedClock, InMemoryEventStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    const PASSWORD: &str = "correct horse battery";

    fn test_app(store: Arc<InMemoryEventStore>) -> Router {
        let state = AppState::new(
            Arc::new(FixedClock::january_15th()),
            store,
            DEFAULT_MAX_RETRIES,
            PasswordHashingParams::build(1024, 1, 1).unwrap(),
        );
        router().with_state(state)
    }

    fn post(uri: &str, email_address: &str, password: &str) -> Request<Body> {
        let body = serde_json::json!({ "email_address": email_address, "password": password });
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn identity_id(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["identity_id"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_register_then_verify_returns_same_identity() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());

        // Act
        let registered = test_app(Arc::clone(&store))
            .oneshot(post("/", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();
        let registered_status = registered.status();
        let registered_id = identity_id(registered).await;
        let verified = test_app(Arc::clone(&store))
            .oneshot(post("/verify", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();

        // Assert
        assert_eq!(registered_status, StatusCode::CREATED);
        assert_eq!(verified.status(), StatusCode::OK);
        assert_eq!(identity_id(verified).await, registered_id);
    }

    #[tokio::test]
    async fn test_register_with_taken_email_returns_409() {
        let store = Arc::new(InMemoryEventStore::new());
        test_app(Arc::clone(&store))
            .oneshot(post("/", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();

        let response = test_app(Arc::clone(&store))
            .oneshot(post("/", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_short_password_returns_400() {
        let app = test_app(Arc::new(InMemoryEventStore::new()));

        let response = app
            .oneshot(post("/", "fiona@gallagher.net", "too short"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_password_returns_401() {
        let store = Arc::new(InMemoryEventStore::new());
        test_app(Arc::clone(&store))
            .oneshot(post("/", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();

        let response = test_app(Arc::clone(&store))
            .oneshot(post("/verify", "fiona@gallagher.net", "incorrect horse battery"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deleted_identity_can_no_longer_verify() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let registered = test_app(Arc::clone(&store))
            .oneshot(post("/", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();
        let id = identity_id(registered).await;

        // Act
        let deleted = test_app(Arc::clone(&store))
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let verified = test_app(Arc::clone(&store))
            .oneshot(post("/verify", "fiona@gallagher.net", PASSWORD))
            .await
            .unwrap();

        // Assert
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert_eq!(verified.status(), StatusCode::UNAUTHORIZED);
    }
}
