use crate::domain::model::{Notification, Severity};
use crate::domain::ports::Notifier;

/// Surfaces notifications through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        let Notification {
            title, description, ..
        } = notification;
        match notification.severity {
            Severity::Info => tracing::info!("ℹ️ {}: {}", title, description),
            Severity::Success => tracing::info!("🎉 {}: {}", title, description),
            Severity::Warning => tracing::warn!("⚠️ {}: {}", title, description),
            Severity::Error => tracing::error!("❌ {}: {}", title, description),
        }
    }
}
