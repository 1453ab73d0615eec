use std::sync::{Arc, Mutex};

use crate::alarm::ActivatedAlarm;

pub type AlarmHandler = Arc<dyn Fn(&ActivatedAlarm) + Send + Sync>;

/// Fan-out point for activated alarms.
///
/// Listeners are keyed by id, so re-subscribing an id replaces the previous
/// handler instead of doubling deliveries. Handlers run on the publishing
/// thread; a slow handler stalls publication and is the listener's liability.
#[derive(Default)]
pub struct NotificationChannel {
    listeners: Mutex<Vec<(String, AlarmHandler)>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener_id: impl Into<String>, handler: F)
    where
        F: Fn(&ActivatedAlarm) + Send + Sync + 'static,
    {
        let listener_id = listener_id.into();
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|(id, _)| *id != listener_id);
        listeners.push((listener_id, Arc::new(handler)));
    }

    pub fn unsubscribe(&self, listener_id: &str) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(id, _)| id != listener_id);
        listeners.len() != before
    }

    /// Deliver `alarm` to every listener exactly once. The listener table is
    /// snapshotted before any handler runs, so handlers may subscribe or
    /// unsubscribe; such changes take effect from the next publication.
    pub fn publish(&self, alarm: &ActivatedAlarm) {
        let handlers: Vec<AlarmHandler> = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in &handlers {
            handler(alarm);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}
