//! Customer CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use domain::{
    CreateCustomer, CustomerModel, CustomerService, DeleteCustomer, FindAllCustomers,
    FindCustomer, UpdateCustomer,
};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ApiError;

/// Base path of the customer resource.
pub const BASE_PATH: &str = "/api/customers";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub customers: CustomerService,
    /// Parent of every request's cancellation token, cancelled when the
    /// server starts shutting down.
    pub shutdown: CancellationToken,
    /// Which store backs the service, reported by `/health`.
    pub storage: &'static str,
}

impl AppState {
    /// A token for one request, cancelled when the returned guard drops.
    ///
    /// Axum drops the handler future when the client goes away, which
    /// drops the guard and cancels any repository call still in flight.
    fn request_token(&self) -> (CancellationToken, DropGuard) {
        let token = self.shutdown.child_token();
        let guard = token.clone().drop_guard();
        (token, guard)
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// GET /api/customers: list customers, filtered, ordered and paged.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FindAllCustomers>, QueryRejection>,
) -> Result<Json<Vec<CustomerModel>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let (cancel, _guard) = state.request_token();
    let customers = state.customers.find_all(query, &cancel).await?;
    Ok(Json(customers))
}

/// GET /api/customers/{id}: a single customer.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerModel>, ApiError> {
    let (cancel, _guard) = state.request_token();
    let customer = state.customers.find_one(FindCustomer::new(id), &cancel).await?;
    Ok(Json(customer))
}

/// POST /api/customers: create a customer.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CustomerModel>, JsonRejection>,
) -> Result<Response, ApiError> {
    let model = json_body(payload)?;
    let (cancel, _guard) = state.request_token();
    let created = state
        .customers
        .create(CreateCustomer::new(model), &cancel)
        .await?;

    let location = format!("{BASE_PATH}/{}", created.id.as_deref().unwrap_or_default());
    let mut response = (StatusCode::CREATED, Json(created)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// PUT /api/customers/{id}: replace a customer's mutable fields.
///
/// The body must carry the same id and the concurrency version it was read
/// with; a stale version yields 409.
#[tracing::instrument(skip(state, payload))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerModel>, JsonRejection>,
) -> Result<Json<CustomerModel>, ApiError> {
    let model = json_body(payload)?;
    let (cancel, _guard) = state.request_token();
    let updated = state
        .customers
        .update(UpdateCustomer::new(id, model), &cancel)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/customers/{id}: delete a customer.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (cancel, _guard) = state.request_token();
    state
        .customers
        .delete(DeleteCustomer::new(id), &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
