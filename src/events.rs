use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderCreated,
    OrderUpdated,
    CartUpdated,
    SkuUpdated,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::OrderCreated => "order_created",
            EventKind::OrderUpdated => "order_updated",
            EventKind::CartUpdated => "cart_updated",
            EventKind::SkuUpdated => "sku_updated",
        }
    }
}

/// Change notification pushed to the admin board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreEvent {
    pub kind: EventKind,
    pub id: String,
    pub sku: String,
    pub status: Option<String>,
    pub at: DateTime<Utc>,
}

impl StoreEvent {
    pub fn new(kind: EventKind, id: impl ToString, sku: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.to_string(),
            sku: sku.into(),
            status: None,
            at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Fan-out of store events to any number of live subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: StoreEvent) {
        // No subscribers is the common case.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(StoreEvent::new(EventKind::OrderCreated, "abc", "DRS-01").with_status("pending"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::OrderCreated);
        assert_eq!(event.sku, "DRS-01");
        assert_eq!(event.status.as_deref(), Some("pending"));
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(1);
        bus.publish(StoreEvent::new(EventKind::SkuUpdated, "x", "x"));
    }
}
