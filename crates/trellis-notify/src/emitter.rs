//! C12: notification delivery. Emission never fails the request that triggered
//! it — failures are logged and swallowed (spec.md §4.9, §5 "Audit + Memento").

use crate::event::NotificationEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;

#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, event: NotificationEvent);
}

/// Broadcasts every event over an in-process channel (the same pattern used for
/// the server's live event stream) and always logs it; this is the fallback
/// transport when no external queue is configured.
pub struct BroadcastNotificationEmitter {
    sender: broadcast::Sender<NotificationEvent>,
}

impl BroadcastNotificationEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl NotificationEmitter for BroadcastNotificationEmitter {
    async fn emit(&self, event: NotificationEvent) {
        tracing::info!(event_id = %event.id, activity = event.activity_type, object = %event.object.id, "mutation notification");
        // `send` errors only when there are no subscribers; that is not a
        // delivery failure worth logging.
        let _ = self.sender.send(event);
    }
}

/// Drops every event after logging it. Used when notifications are disabled
/// entirely but the rest of the pipeline should not special-case "no emitter".
pub struct LoggingNotificationEmitter;

#[async_trait]
impl NotificationEmitter for LoggingNotificationEmitter {
    async fn emit(&self, event: NotificationEvent) {
        match event.to_json() {
            Ok(json) => tracing::info!(%json, "notification emitted (no transport configured)"),
            Err(err) => tracing::warn!(%err, "failed to serialize notification event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ActivityType;

    #[tokio::test]
    async fn broadcast_emitter_delivers_to_subscribers() {
        let emitter = BroadcastNotificationEmitter::new(16);
        let mut receiver = emitter.subscribe();
        let event = NotificationEvent::new(
            ActivityType::Update,
            "urn:trellis:anonymous",
            "http://example.org/res1",
            vec![],
            chrono::Utc::now(),
        );
        emitter.emit(event.clone()).await;
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id, event.id);
    }

    #[tokio::test]
    async fn broadcast_emitter_does_not_fail_with_no_subscribers() {
        let emitter = BroadcastNotificationEmitter::new(16);
        let event = NotificationEvent::new(ActivityType::Delete, "urn:trellis:anonymous", "http://example.org/res1", vec![], chrono::Utc::now());
        emitter.emit(event).await;
    }
}
