//! Application state.

use std::sync::Arc;

use scrumkit_core::auth::AuthGateway;
use scrumkit_store::{ChangeEvent, ChangeSender, SharedStore, create_change_channel};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: Arc<AuthGateway>,
    pub tx: ChangeSender,
}

impl AppState {
    pub fn new(store: SharedStore, auth: Arc<AuthGateway>) -> Self {
        Self {
            store,
            auth,
            tx: create_change_channel(),
        }
    }

    /// State with the built-in identity provider on the same store.
    pub fn with_store(store: SharedStore) -> Self {
        let auth = Arc::new(AuthGateway::with_store_provider(store.clone()));
        Self::new(store, auth)
    }

    /// Broadcast a change to all WebSocket clients.
    pub fn broadcast(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}
