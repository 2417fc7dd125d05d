//! HTTP API server with observability for the customer service.
//!
//! Provides REST endpoints for customer management, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{Customer, CustomerEvent, CustomerEventLogger, CustomerService, Policy};
use metrics_exporter_prometheus::PrometheusHandle;
use repository::{
    InMemoryRepository, InProcessEventPublisher, PostgresRepository, SharedRepository, decorate,
};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::customers::{AppState, BASE_PATH};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            BASE_PATH,
            get(routes::customers::list).post(routes::customers::create),
        )
        .route(
            &format!("{BASE_PATH}/{{id}}"),
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::delete),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Publisher delivering committed customer events to the built-in handlers.
pub fn customer_publisher() -> InProcessEventPublisher<CustomerEvent> {
    InProcessEventPublisher::new().with_handler(Arc::new(CustomerEventLogger))
}

/// Decorated repository over an in-memory store.
pub fn in_memory_repository(audit_user: &str) -> SharedRepository<Customer> {
    decorate(
        InMemoryRepository::<Customer>::new(),
        customer_publisher(),
        audit_user,
    )
}

/// Decorated repository over PostgreSQL. Applies pending migrations first.
pub async fn postgres_repository(
    pool: PgPool,
    audit_user: &str,
) -> repository::Result<SharedRepository<Customer>> {
    let store = PostgresRepository::<Customer>::new(pool);
    store.run_migrations().await?;
    Ok(decorate(store, customer_publisher(), audit_user))
}

/// Creates the application state around a repository.
pub fn create_state(
    repository: SharedRepository<Customer>,
    policy: Policy,
    storage: &'static str,
    shutdown: CancellationToken,
) -> Arc<AppState> {
    Arc::new(AppState {
        customers: CustomerService::new(repository).with_policy(policy),
        shutdown,
        storage,
    })
}

/// Creates in-memory application state with the default policy.
pub fn create_default_state() -> Arc<AppState> {
    create_state(
        in_memory_repository("system"),
        Policy::default(),
        "memory",
        CancellationToken::new(),
    )
}
