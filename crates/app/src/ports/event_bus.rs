//! Event bus port: publish/subscribe for device events.

use devicehub_domain::event::DeviceEvent;

/// Publishes device events to interested subscribers.
///
/// Publishing never blocks and never fails from the caller's point of view:
/// devices notify from inside command resolutions.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: DeviceEvent);
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) {
        (**self).publish(event);
    }
}
