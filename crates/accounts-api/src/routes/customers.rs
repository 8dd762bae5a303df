//! Routes for the Customer bounded context.

use accounts_customer::application::command_handlers;
use accounts_customer::application::query_handlers::{self, CustomerView};
use accounts_customer::domain::commands::{
    ChangeCustomerEmailAddress, ChangeCustomerName, ConfirmCustomerEmailAddress, DeleteCustomer,
    RegisterCustomer,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a customer.
#[derive(Debug, Deserialize)]
pub struct RegisterCustomerRequest {
    pub email_address: String,
    pub given_name: String,
    pub family_name: String,
}

/// Response body for a registered customer.
#[derive(Debug, Serialize)]
pub struct RegisterCustomerResponse {
    pub customer_id: String,
}

/// Request body for confirming the current email address.
#[derive(Debug, Deserialize)]
pub struct ConfirmEmailAddressRequest {
    pub confirmation_hash: String,
}

/// Request body for changing the email address.
#[derive(Debug, Deserialize)]
pub struct ChangeEmailAddressRequest {
    pub email_address: String,
}

/// Request body for changing the name.
#[derive(Debug, Deserialize)]
pub struct ChangeNameRequest {
    pub given_name: String,
    pub family_name: String,
}

/// POST /api/v1/customers
#[instrument(skip(state, request))]
async fn register_customer(
    State(state): State<AppState>,
    Json(request): Json<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<RegisterCustomerResponse>), ApiError> {
    let command = RegisterCustomer::build(
        &request.email_address,
        &request.given_name,
        &request.family_name,
    )?;
    let customer_id = command_handlers::handle_register_customer(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterCustomerResponse {
            customer_id: customer_id.to_string(),
        }),
    ))
}

/// POST /api/v1/customers/{customer_id}/confirm-email
#[instrument(skip(state, request))]
async fn confirm_email_address(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<ConfirmEmailAddressRequest>,
) -> Result<StatusCode, ApiError> {
    let command = ConfirmCustomerEmailAddress::build(&customer_id, &request.confirmation_hash)?;
    command_handlers::handle_confirm_customer_email_address(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/customers/{customer_id}/email
#[instrument(skip(state, request))]
async fn change_email_address(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<ChangeEmailAddressRequest>,
) -> Result<StatusCode, ApiError> {
    let command = ChangeCustomerEmailAddress::build(&customer_id, &request.email_address)?;
    command_handlers::handle_change_customer_email_address(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/customers/{customer_id}/name
#[instrument(skip(state, request))]
async fn change_name(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<ChangeNameRequest>,
) -> Result<StatusCode, ApiError> {
    let command =
        ChangeCustomerName::build(&customer_id, &request.given_name, &request.family_name)?;
    command_handlers::handle_change_customer_name(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/customers/{customer_id}
#[instrument(skip(state))]
async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let command = DeleteCustomer::build(&customer_id)?;
    command_handlers::handle_delete_customer(
        &command,
        state.clock.as_ref(),
        state.event_store.as_ref(),
        state.max_retries,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/customers/{customer_id}
#[instrument(skip(state))]
async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerView>, ApiError> {
    let view =
        query_handlers::get_customer_view_by_id(&customer_id, state.event_store.as_ref()).await?;
    Ok(Json(view))
}

/// Returns the router for the customer context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_customer))
        .route("/{customer_id}", get(get_customer).delete(delete_customer))
        .route("/{customer_id}/confirm-email", post(confirm_email_address))
        .route("/{customer_id}/email", put(change_email_address))
        .route("/{customer_id}/name", put(change_name))
}
