use lifelight_rs_protocol::{DispatchError, NotificationDispatcher, NotificationEvent};
use parking_lot::Mutex;

/// Dispatcher that keeps every notification it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Dispatcher that rejects every notification, counting attempts.
#[derive(Debug, Default)]
pub struct FailingDispatcher {
    attempts: Mutex<usize>,
}

impl FailingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl NotificationDispatcher for FailingDispatcher {
    fn dispatch(&self, _event: &NotificationEvent) -> Result<(), DispatchError> {
        *self.attempts.lock() += 1;
        Err(DispatchError::Rejected("host unavailable".to_string()))
    }
}
