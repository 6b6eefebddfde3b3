mod detect;
mod health;
mod metrics;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use detect::ROUTE as DETECT_ROUTE;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route(DETECT_ROUTE, post(detect::detect))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
}
