//! Local notification bus: the subscription point for UI hosts.

use lifelight_rs_protocol::{DispatchError, NotificationDispatcher, NotificationEvent};
use log::debug;
use tokio::sync::broadcast;

/// Broadcast-backed notification bus.
#[derive(Clone, Debug)]
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl NotificationBus {
    /// Create a new bus with the given per-subscriber buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        debug!("notification bus initialized (buffer={})", buffer);
        Self { sender }
    }

    /// Subscribe to notifications emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl NotificationDispatcher for NotificationBus {
    /// Publish the event; fails when nobody is listening.
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError> {
        self.sender
            .send(event.clone())
            .map(|receivers| {
                debug!(
                    "notification published (tag={}, receivers={})",
                    event.tag, receivers
                );
            })
            .map_err(|_| DispatchError::NoSubscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationBus;
    use chrono::NaiveDate;
    use lifelight_rs_protocol::{DispatchError, NotificationDispatcher, NotificationEvent};
    use pretty_assertions::assert_eq;

    fn check_in() -> NotificationEvent {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        NotificationEvent::health_check_in(day)
    }

    #[test]
    fn dispatch_without_subscribers_fails() {
        let bus = NotificationBus::new(4);
        let err = bus.dispatch(&check_in()).unwrap_err();
        assert_eq!(err, DispatchError::NoSubscribers);
    }

    #[tokio::test]
    async fn subscribers_receive_dispatched_events() {
        let bus = NotificationBus::new(4);
        let mut receiver = bus.subscribe();
        bus.dispatch(&check_in()).expect("dispatch");
        let event = receiver.recv().await.expect("event");
        assert_eq!(event, check_in());
    }
}
