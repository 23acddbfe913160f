//! Transient user notifications (toasts).

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub const DEFAULT_NOTIFICATION_MS: i64 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel { Info, Success, Error }

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            created_at: Utc::now(),
            duration: Duration::milliseconds(DEFAULT_NOTIFICATION_MS),
        }
    }

    pub fn info(message: impl Into<String>) -> Self { Self::new(NotificationLevel::Info, message) }
    pub fn success(message: impl Into<String>) -> Self { Self::new(NotificationLevel::Success, message) }
    pub fn error(message: impl Into<String>) -> Self { Self::new(NotificationLevel::Error, message) }

    pub fn with_duration(mut self, duration: Duration) -> Self { self.duration = duration; self }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool { now >= self.created_at + self.duration }
}
