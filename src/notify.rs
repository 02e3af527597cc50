//! Seam for the external notification-scheduling service
//!
//! Reminder delivery is a platform concern; the core only asks for a
//! daily reminder to exist or not. Correctness never depends on this.

/// Narrow contract the core calls; the platform provides the real
/// implementation.
pub trait NotificationScheduler: Send + Sync {
    /// Schedule a repeating daily reminder at the given local time.
    /// Returns an identifier usable with [`cancel`](Self::cancel).
    fn schedule_daily(&self, hour: u8, minute: u8) -> String;

    fn cancel(&self, id: &str);
}

/// Scheduler used when no platform integration exists; logs and drops.
#[derive(Debug, Default)]
pub struct NullScheduler;

impl NotificationScheduler for NullScheduler {
    fn schedule_daily(&self, hour: u8, minute: u8) -> String {
        log::debug!("no notification backend; daily reminder {hour:02}:{minute:02} dropped");
        format!("null-{hour:02}{minute:02}")
    }

    fn cancel(&self, _id: &str) {}
}
