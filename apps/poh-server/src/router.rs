//! HTTP routing.

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Path Slack delivers Events API callbacks to.
pub const EVENTS_PATH: &str = "/slack/events";

/// Builds the application router.
///
/// The events route accepts every method so that non-POST deliveries get
/// the dispatcher's 502 instead of axum's 405.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(EVENTS_PATH, any(handlers::events::handle_events))
        .route("/health", get(handlers::health))
        .with_state(state)
}
