//! Shared application state for poh-server.
//!
//! [`AppState`] is passed (as `Arc<AppState>`) to every axum handler. It
//! holds only immutable values built at startup.

use poh_core::Dispatcher;

/// Shared application state, passed as `Arc<AppState>` to all handlers.
#[derive(Debug)]
pub struct AppState {
    dispatcher: Dispatcher,
}

impl AppState {
    /// Creates the application state around a configured dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns the webhook dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
