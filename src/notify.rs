//! Notification sink
//!
//! Fire-and-forget user notifications (toasts in the browser client).

pub trait Notifier: Send + Sync {
    fn success(&self, text: &str);
    fn error(&self, text: &str);
    fn warn(&self, text: &str);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, text: &str) {
        log::info!("✅ {}", text);
    }

    fn error(&self, text: &str) {
        log::error!("❌ {}", text);
    }

    fn warn(&self, text: &str) {
        log::warn!("⚠️  {}", text);
    }
}

/// Surface a write-path failure to the user
pub fn notify_failure(notifier: &dyn Notifier, err: &crate::WavePortalError) {
    match err {
        crate::WavePortalError::NoProvider => notifier.warn("Please install 🦊 MetaMask"),
        other => notifier.error(&other.to_string()),
    }
}
