//! # DocEase API
//!
//! The API crate provides the web server for the DocEase appointment
//! service. It exposes RESTful endpoints for booking, listing, cancelling,
//! and rescheduling appointments, plus a reconciliation endpoint that
//! repairs drift between the two stored copies of a record.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic on top of the ledger
//! - **Middleware**: Provide session extraction and error handling
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework; persistence lives behind the
//! `AppointmentStore` contract from `docease-db`.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for session extraction and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{BoxError, Router};
use docease_db::repositories::{AppointmentStore, PgAppointmentStore};
use docease_ledger::{MutationCoordinator, ReadProjection};
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers.
///
/// The store is injected explicitly at construction time; handlers never
/// reach for global database handles.
pub struct ApiState {
    /// Coordinates the dual writes behind create / cancel / reschedule
    pub coordinator: MutationCoordinator,
    /// Serves the appointment list and single-record reads
    pub projection: ReadProjection,
    /// Raw store handle, used by the reconciliation endpoint
    pub store: Arc<dyn AppointmentStore>,
}

impl ApiState {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            coordinator: MutationCoordinator::new(store.clone()),
            projection: ReadProjection::new(store.clone()),
            store,
        }
    }
}

/// Starts the API server with the provided configuration and database
/// connection.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let store: Arc<dyn AppointmentStore> = Arc::new(PgAppointmentStore::new(db_pool));
    let state = Arc::new(ApiState::new(store));

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Appointment ledger endpoints
        .merge(routes::appointment::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Every store round trip is bounded; a stuck backend surfaces as a
    // retryable timeout instead of a hung request
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
