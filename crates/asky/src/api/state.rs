//! Application state shared across handlers.

use std::sync::Arc;

use crate::ws::ChatHub;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast hub owning the connection registry.
    pub hub: Arc<ChatHub>,
}

impl AppState {
    /// Create new application state, spawning the hub task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self {
            hub: Arc::new(ChatHub::spawn()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
