use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{AppState, handle_host_resources, health};
use crate::snmp::Connector;

pub fn create_router<C: Connector + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/host-resources", post(handle_host_resources::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
