//! Broadcast channel for document change notifications.
//!
//! Writers publish after a successful mutation; the web layer forwards
//! events to WebSocket clients so open views can reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What happened to a document.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Change notification payload.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChangeEvent {
    /// A single document was written or removed.
    DocumentChanged {
        collection: String,
        id: String,
        kind: ChangeKind,
    },
    /// Many documents changed at once (e.g. after seeding); reload everything.
    Refresh,
}

impl ChangeEvent {
    pub fn created(collection: &str, id: &str) -> Self {
        Self::DocumentChanged {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Created,
        }
    }

    pub fn updated(collection: &str, id: &str) -> Self {
        Self::DocumentChanged {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Updated,
        }
    }

    pub fn deleted(collection: &str, id: &str) -> Self {
        Self::DocumentChanged {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Deleted,
        }
    }
}

/// Type alias for the broadcast sender.
pub type ChangeSender = broadcast::Sender<ChangeEvent>;

/// Type alias for the broadcast receiver.
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

/// Create a new broadcast channel with default capacity.
pub fn create_change_channel() -> ChangeSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = ChangeEvent::updated("epics", "e1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DocumentChanged");
        assert_eq!(json["data"]["collection"], "epics");
        assert_eq!(json["data"]["kind"], "updated");
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let tx = create_change_channel();
        let mut rx = tx.subscribe();
        tx.send(ChangeEvent::Refresh).unwrap();
        assert_eq!(rx.recv().await.unwrap(), ChangeEvent::Refresh);
    }
}
