/// Upward notifications from the viewer
use crate::model::{Group, ItemId};
use crate::navigation::Cursor;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Viewer events, also streamed to subscribers of a `BroadcastObserver`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
    /// A group's unseen flag was cleared; carries the full updated list
    GroupsChanged { groups: Vec<Group> },
    /// The displayed item changed
    CursorChanged { cursor: Cursor, item_id: ItemId },
    /// The user reacted on an item (optimistic, before the service answers)
    Reacted { item_id: ItemId, symbol: String },
    /// Viewer reached its terminal state
    Closed,
}

/// Observer interface for the surface that hosts the viewer
pub trait ViewerObserver: Send + Sync {
    fn on_groups_changed(&self, _groups: &[Group]) {}

    fn on_close(&self) {}

    /// Every event, including the two above
    fn on_event(&self, _event: &ViewerEvent) {}
}

/// Forwards every event onto a broadcast channel
#[derive(Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<ViewerEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.tx.subscribe()
    }
}

impl ViewerObserver for BroadcastObserver {
    fn on_event(&self, event: &ViewerEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event.clone());
    }
}
