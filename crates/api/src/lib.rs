//! # Lessonbook API
//!
//! HTTP surface of the lesson booking service. Handlers are thin: they pull
//! the acting [`Identity`](lessonbook_core::models::identity::Identity) out of
//! the request, call into `lessonbook_core::services` and map the result.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint table, one module per ledger
//! - **Handlers**: request extraction and response shaping
//! - **Middleware**: identity extraction and error mapping
//! - **Config**: environment configuration

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Identity extraction and error mapping
pub mod middleware;
/// Route definitions
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use eyre::Result;
use lessonbook_core::{policy::LedgerPolicy, store::Store};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Shared application state handed to every handler.
pub struct ApiState {
    pub store: Arc<dyn Store>,
    pub policy: LedgerPolicy,
}

impl ApiState {
    pub fn new(store: Arc<dyn Store>, policy: LedgerPolicy) -> Self {
        Self { store, policy }
    }
}

/// Builds the router with every endpoint attached to `state`, without the
/// transport layers added by [`start_server`].
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::catalog::routes())
        .merge(routes::availability::routes())
        .merge(routes::quota::routes())
        .merge(routes::booking::routes())
        .merge(routes::history::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(USER_ID_HEADER),
            header::HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Serves the API until the listener fails.
///
/// The caller owns logging setup and the choice of store; this only wires
/// the router, CORS, request timeout and request tracing.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn Store>) -> Result<()> {
    let state = Arc::new(ApiState::new(store, config.policy));
    let app = build_router(state);

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
