//! Console delivery of holder notifications

use bpq_core::{Notification, NotificationKind, NotificationSink};

/// Chat text for a notification
#[must_use]
pub fn message(notification: &Notification) -> String {
    let key = &notification.key;
    match notification.kind {
        NotificationKind::Admitted => {
            format!("You have been added to the blueprint queue for {key}.")
        }
        NotificationKind::RemovedFromQueue => {
            format!("You have been removed from the blueprint queue for {key}.")
        }
        NotificationKind::LostByRotation => {
            format!("You have lost the blueprint for {key} (queue rotation).")
        }
        NotificationKind::LostByEnforcement => {
            format!("You have lost the blueprint for {key} (queue enforcement).")
        }
    }
}

/// Prints each notification to stdout as it arrives
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    json: bool,
}

impl ConsoleNotifier {
    #[must_use]
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    fn render(self, notification: &Notification) -> String {
        if self.json {
            serde_json::json!({
                "type": "notification",
                "holder": notification.holder,
                "kind": notification.kind,
                "key": notification.key,
                "at": notification.at,
                "message": message(notification),
            })
            .to_string()
        } else {
            format!("[{}] {}", notification.holder, message(notification))
        }
    }
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) {
        println!("{}", self.render(notification));
    }
}
