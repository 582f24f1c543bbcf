//! Outbound notification sink

use std::sync::Arc;

use parking_lot::Mutex;

use crate::logging::Logger;

use super::events::Notification;

/// Delivers notifications to a session's front end
pub trait Notifier: Send + Sync {
    fn notify(&self, session_id: &str, notification: Notification);
}

/// Writes every notification to the logger
pub struct LoggingNotifier {
    logger: Arc<dyn Logger>,
}

impl LoggingNotifier {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Notifier for LoggingNotifier {
    fn notify(&self, session_id: &str, notification: Notification) {
        let body = serde_json::to_string(&notification).unwrap_or_default();
        self.logger
            .info(&format!("[Notify {}] {}", session_id, body));
    }
}

/// Keeps every notification, for tests
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications sent to one session, in order
    pub fn for_session(&self, session_id: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Event names sent to one session, in order
    pub fn names(&self, session_id: &str) -> Vec<&'static str> {
        self.for_session(session_id).iter().map(|n| n.name()).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, session_id: &str, notification: Notification) {
        self.sent.lock().push((session_id.to_string(), notification));
    }
}
