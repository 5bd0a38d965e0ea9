use fedgate_core::LifecycleEvent;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

/// Default per-subscriber queue depth. A subscriber that falls this far
/// behind the publisher starts losing its oldest unread events (§4.1's
/// documented lossy-backpressure policy) rather than stalling `publish`.
const DEFAULT_CAPACITY: usize = 256;

/// Event Bus (C1): in-process pub/sub of lifecycle events to N subscribers.
///
/// Built on [`tokio::sync::broadcast`], which already implements exactly
/// the policy §4.1 asks for: `publish` never blocks on a slow subscriber,
/// and a subscriber that falls behind the bounded capacity silently skips
/// ahead to the oldest event still buffered rather than deadlocking the
/// publisher. Within one subscriber, delivery is in publish order.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber. Never blocks; if there
    /// are no subscribers, the event is simply dropped.
    pub fn publish(&self, event: LifecycleEvent) {
        // `send` only errors when there are zero receivers, which is not a
        // failure from the publisher's point of view.
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream. Each call creates an independent FIFO
    /// queue; a subscriber that lags beyond capacity observes a gap
    /// (logged, not surfaced as an error the caller must handle) and
    /// resumes from the oldest event still buffered.
    pub fn subscribe(&self) -> impl Stream<Item = LifecycleEvent> {
        let receiver = self.sender.subscribe();
        BroadcastStream::new(receiver).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "event bus subscriber lagged; dropping oldest events");
                None
            }
        })
    }

    /// Number of subscribers currently attached. Informational only (e.g.
    /// for health/metrics endpoints), not used in any policy decision.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use fedgate_core::{EventData, EventType};
    use fedgate_core::GatewayId;

    use super::*;

    fn sample_event(name: &str) -> LifecycleEvent {
        LifecycleEvent::new(
            EventType::GatewayAdded,
            EventData {
                id: GatewayId::new(),
                name: name.to_owned(),
                url: format!("https://{name}.example"),
                description: String::new(),
                enabled: true,
            },
        )
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_publish_order() {
        let bus = EventBus::new();
        let mut stream = Box::pin(bus.subscribe());

        bus.publish(sample_event("g1"));
        bus.publish(sample_event("g2"));

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.data.name, "g1");
        assert_eq!(second.data.name, "g2");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(sample_event("nobody-listening"));
    }

    #[tokio::test]
    async fn independent_subscribers_each_get_every_event() {
        let bus = EventBus::new();
        let mut a = Box::pin(bus.subscribe());
        let mut b = Box::pin(bus.subscribe());

        bus.publish(sample_event("g1"));

        assert_eq!(a.next().await.unwrap().data.name, "g1");
        assert_eq!(b.next().await.unwrap().data.name, "g1");
    }

    #[tokio::test]
    async fn lagging_subscriber_drops_oldest_instead_of_blocking_publish() {
        let bus = EventBus::with_capacity(2);
        let mut lagging = Box::pin(bus.subscribe());

        for i in 0..5 {
            bus.publish(sample_event(&format!("g{i}")));
        }

        // The slow subscriber missed some events but the stream still
        // yields the remaining ones without the publisher ever blocking.
        let received = lagging.next().await;
        assert!(received.is_some());
    }
}
