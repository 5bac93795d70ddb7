//! Shared application state for WebSocket connections

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::lifecycle::LifecycleCoordinator;
use crate::registry::ChannelRegistry;
use crate::router::MessageRouter;

/// Composition root for the relay core: one registry instance injected into
/// the router and the lifecycle coordinator, plus the connection id counter.
pub struct AppState {
    pub registry: Arc<ChannelRegistry>,
    pub router: MessageRouter,
    pub lifecycle: LifecycleCoordinator,
    connection_counter: AtomicU64,
}

impl AppState {
    pub fn new() -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        Self {
            router: MessageRouter::new(registry.clone()),
            lifecycle: LifecycleCoordinator::new(registry.clone()),
            registry,
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Allocate the next connection id.
    pub fn next_connection_id(&self) -> u64 {
        self.connection_counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionHandle;

    #[test]
    fn test_connection_ids_are_unique_and_increasing() {
        let state = AppState::new();
        assert_eq!(state.next_connection_id(), 0);
        assert_eq!(state.next_connection_id(), 1);
        assert_eq!(state.next_connection_id(), 2);
    }

    #[test]
    fn test_router_and_lifecycle_share_the_injected_registry() {
        let state = AppState::new();
        let (handle, _rx) = ConnectionHandle::new(state.next_connection_id());

        state
            .router
            .handle_frame(&handle, r#"{"type":"join","channel":"room1"}"#);
        assert!(state.registry.is_member("room1", &handle));

        state.lifecycle.on_close(&handle);
        assert!(!state.registry.is_member("room1", &handle));
    }
}
