//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use devicehub_domain::event::DeviceEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). A subscriber that falls more than
/// `capacity` events behind loses the oldest ones.
#[derive(Debug, Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DeviceEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("no subscriber for device event");
        }
    }
}

#[cfg(test)]
mod tests {
    use devicehub_domain::id::DeviceId;

    use super::*;

    fn param_updated(id: u32) -> DeviceEvent {
        DeviceEvent::ParamUpdated {
            device_id: DeviceId::new(id),
            param: "name".to_string(),
        }
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(param_updated(1));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, param_updated(1));
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DeviceEvent::SaveRequested);

        assert_eq!(rx1.recv().await.unwrap(), DeviceEvent::SaveRequested);
        assert_eq!(rx2.recv().await.unwrap(), DeviceEvent::SaveRequested);
    }

    #[test]
    fn should_not_fail_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        bus.publish(DeviceEvent::SaveRequested);
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(param_updated(1));

        let mut rx = bus.subscribe();
        bus.publish(param_updated(2));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.device_id(), Some(DeviceId::new(2)));
    }
}
