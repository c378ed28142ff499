use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, Router},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use crate::state::AppState;

/// Assembles the full application router with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_allowed_origins.trim() == "*" {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_allowed_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(origins)
    };

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::follows::router())
        .nest("/tweets", routes::tweets::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            utils::middleware::auth_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Minitter is running!"
}
